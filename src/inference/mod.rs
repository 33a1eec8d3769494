//! C1 (type inferencer) and C2 (storage inferencer) — pure, total,
//! side-effect-free classifiers (§4.1, §4.2).

pub mod storage_inferencer;
pub mod type_inferencer;

pub use storage_inferencer::{classify_storage, StorageClass};
pub use type_inferencer::{observe, ColumnType, RunningColumnType};
