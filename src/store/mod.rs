//! C4–C6: the three store adapters. Graph and document are trait
//! boundaries with in-process reference implementations (§1 treats the
//! concrete engines as external collaborators); relational is a real
//! `sqlx::PgPool` adapter because §4.6 fixes its shape completely.

pub mod document;
pub mod graph;
pub mod relational;

pub use document::{DocumentStore, InMemoryDocumentStore, MetadataMap};
pub use graph::{
    EntityPatch, GraphEntityRecord, GraphStore, InMemoryGraphStore, KindFilter,
    RelationshipUpdateInput,
};
pub use relational::{MappingRow, RelationalStore};
