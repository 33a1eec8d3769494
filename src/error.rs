//! Error kinds shared by every layer of the entity mesh.
//!
//! Mirrors `entity-gateway::index::traits::IndexError` in spirit: a flat
//! `thiserror` enum that adapters and services propagate unchanged, and
//! that the gRPC layer maps to a single `tonic::Status` at the edge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("incompatible schema change for {table}: {reason}")]
    IncompatibleSchemaChange { table: String, reason: String },

    #[error(
        "schema violation at row {row_index}, column '{column_name}': expected {expected_type}, got {observed_value}"
    )]
    SchemaViolation {
        row_index: usize,
        column_name: String,
        expected_type: String,
        observed_value: String,
    },

    #[error("unsupported storage class for attribute '{attribute_name}'")]
    UnsupportedStorageClass { attribute_name: String },

    #[error("dependency conflict: {0}")]
    DependencyConflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("cancelled")]
    Cancelled,
}

impl EntityError {
    /// Wrap this error with the attribute name and phase it surfaced from,
    /// the way `EntityService` annotates per-attribute failures (§7
    /// propagation policy) without swallowing the underlying kind.
    pub fn with_context(self, phase: &str, attribute_name: Option<&str>) -> Self {
        let ctx = match attribute_name {
            Some(name) => format!("{phase}/{name}"),
            None => phase.to_string(),
        };
        match self {
            EntityError::InvalidArgument(msg) => {
                EntityError::InvalidArgument(format!("{ctx}: {msg}"))
            }
            EntityError::NotFound(msg) => EntityError::NotFound(format!("{ctx}: {msg}")),
            EntityError::AlreadyExists(msg) => {
                EntityError::AlreadyExists(format!("{ctx}: {msg}"))
            }
            EntityError::DependencyConflict(msg) => {
                EntityError::DependencyConflict(format!("{ctx}: {msg}"))
            }
            EntityError::StoreUnavailable(msg) => {
                EntityError::StoreUnavailable(format!("{ctx}: {msg}"))
            }
            other => other,
        }
    }
}

impl From<sqlx::Error> for EntityError {
    fn from(err: sqlx::Error) -> Self {
        EntityError::StoreUnavailable(err.to_string())
    }
}

impl From<EntityError> for tonic::Status {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::InvalidArgument(msg) => tonic::Status::invalid_argument(msg),
            EntityError::NotFound(msg) => tonic::Status::not_found(msg),
            EntityError::AlreadyExists(msg) => tonic::Status::already_exists(msg),
            EntityError::IncompatibleSchemaChange { table, reason } => {
                tonic::Status::failed_precondition(format!(
                    "incompatible schema change for {table}: {reason}"
                ))
            }
            EntityError::SchemaViolation { .. } => {
                tonic::Status::failed_precondition(err.to_string())
            }
            EntityError::UnsupportedStorageClass { .. } => {
                tonic::Status::failed_precondition(err.to_string())
            }
            EntityError::DependencyConflict(msg) => tonic::Status::failed_precondition(msg),
            EntityError::StoreUnavailable(msg) => tonic::Status::unavailable(msg),
            EntityError::Cancelled => tonic::Status::cancelled("cancelled"),
        }
    }
}

pub type Result<T> = std::result::Result<T, EntityError>;
