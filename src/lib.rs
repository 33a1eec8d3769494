//! A polyglot entity mesh: graph identity/relationships, document
//! metadata, and relational per-attribute tables behind one service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       gRPC (EntityService)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EntityService (C9)                      │
//! └──────────────┬─────────────────┬─────────────────┬──────────┘
//!                │                 │                 │
//!                ▼                 ▼                 ▼
//!         GraphStore (C4)   DocumentStore (C5)  AttributeDispatcher (C8)
//!                                                      │
//!                                                      ▼
//!                                            TabularEngine (C7)
//!                                                      │
//!                                                      ▼
//!                                            RelationalStore (C6)
//! ```
//!
//! C1 (type inference) and C2/C3 (storage classification, schema
//! synthesis) are pure functions the dispatcher and tabular engine call
//! along the way; see `inference` and `schema`.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod inference;
pub mod model;
pub mod sanitize;
pub mod schema;
pub mod server;
pub mod service;
pub mod store;
pub mod tabular;

#[allow(clippy::all)]
pub mod proto {
    tonic::include_proto!("entity.v1");
}

pub use error::{EntityError, Result};
