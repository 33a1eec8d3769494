//! The data model of §3: entities, kinds, time-bounded values,
//! relationships, attribute lookup records, and the opaque value tree
//! that feeds the storage inferencer.

mod attribute;
mod entity;
mod kind;
mod relationship;
mod time_bounded;
mod value;

pub use attribute::{storage_path_for, AttributeLookupRecord};
pub use entity::Entity;
pub use kind::Kind;
pub use relationship::{
    Direction, Relationship, RelationshipFilter, RelationshipPatch, RelationshipSpec,
};
pub use time_bounded::TimeBoundedValue;
pub use value::{RawValue, ScalarValue};

/// Treats `None` and `Some("")` identically, matching the original
/// Go implementation's boundary handling (see SPEC_FULL.md §3).
pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|s| s.trim().is_empty()).unwrap_or(true)
}
