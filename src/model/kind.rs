use serde::{Deserialize, Serialize};

/// A two-level classification. Both levels are required at creation and
/// immutable for the life of the entity (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kind {
    pub major: String,
    pub minor: String,
}

impl Kind {
    pub fn new(major: impl Into<String>, minor: impl Into<String>) -> Self {
        Self {
            major: major.into(),
            minor: minor.into(),
        }
    }
}
