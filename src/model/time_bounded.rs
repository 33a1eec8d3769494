use serde::{Deserialize, Serialize};

/// `(start, end?, payload)` — the temporal envelope used for entity
/// names, attribute history entries, and relationships (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBoundedValue<T> {
    pub start: String,
    pub end: Option<String>,
    pub payload: T,
}

impl<T> TimeBoundedValue<T> {
    pub fn new(start: impl Into<String>, end: Option<String>, payload: T) -> Self {
        Self {
            start: start.into(),
            end,
            payload,
        }
    }

    /// "Active at T" predicate shared by relationship filtering.
    pub fn active_at(&self, at: &str) -> bool {
        self.start.as_str() <= at
            && self.end.as_deref().map(|e| e >= at).unwrap_or(true)
    }
}
