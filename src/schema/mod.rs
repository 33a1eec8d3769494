//! C3: schema synthesis over an inferred value, plus the schema
//! compatibility check C7 runs during tabular schema evolution (§4.3,
//! §4.7).

pub mod compatibility;
pub mod synthesizer;

pub use compatibility::{check_compatible, CompatibilityError};
pub use synthesizer::{synthesize, ColumnSchema, SchemaInfo};
