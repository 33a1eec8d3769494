use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::kind::Kind;
use super::relationship::Relationship;
use super::time_bounded::TimeBoundedValue;
use super::value::RawValue;

/// The addressable unit (§3). `kind` is immutable after creation;
/// `terminated`, when set, is `>= created`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub kind: Kind,
    pub name: TimeBoundedValue<String>,
    pub created: String,
    pub terminated: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub attributes: HashMap<String, Vec<TimeBoundedValue<RawValue>>>,
    pub relationships: HashMap<String, Relationship>,
}

impl Entity {
    /// The five-check bundle shared by the graph adapter's create
    /// validation and the entity service (§4.4).
    pub fn validate_for_create(&self) -> Result<(), Vec<&'static str>> {
        let mut missing = Vec::new();
        if super::is_blank(Some(&self.id)) {
            missing.push("id");
        }
        if super::is_blank(Some(&self.kind.major)) {
            missing.push("kind.major");
        }
        if super::is_blank(Some(&self.kind.minor)) {
            missing.push("kind.minor");
        }
        if super::is_blank(Some(&self.name.payload)) {
            missing.push("name.value");
        }
        if super::is_blank(Some(&self.created)) {
            missing.push("created");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}
