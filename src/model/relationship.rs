use serde::{Deserialize, Serialize};

/// Direction preserved on read — the design choice of §4.4: the name
/// returned to callers for `read_relationships` always stitches
/// `direction = OUTGOING` for edges owned by the queried entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// `(id, name, related_entity_id, start, end?, direction)` (§3).
///
/// After creation only `start`/`end` are mutable; `name`,
/// `related_entity_id`, and `direction` are frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub name: String,
    pub related_entity_id: String,
    pub start: String,
    pub end: Option<String>,
    pub direction: Direction,
}

impl Relationship {
    pub fn active_at(&self, at: &str) -> bool {
        self.start.as_str() <= at && self.end.as_deref().map(|e| e >= at).unwrap_or(true)
    }
}

/// Filter keys accepted by `read_filtered_relationships` (§4.4): `id`,
/// `name`, `related_entity_id`, `start`, `end`, `direction`. Equality on
/// each supplied key; combinations are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct RelationshipFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub related_entity_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub direction: Option<Direction>,
}

impl RelationshipFilter {
    pub fn matches(&self, rel: &Relationship) -> bool {
        if let Some(id) = &self.id {
            if &rel.id != id {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &rel.name != name {
                return false;
            }
        }
        if let Some(related) = &self.related_entity_id {
            if &rel.related_entity_id != related {
                return false;
            }
        }
        if let Some(start) = &self.start {
            if &rel.start != start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if rel.end.as_ref() != Some(end) {
                return false;
            }
        }
        if let Some(direction) = self.direction {
            if rel.direction != direction {
                return false;
            }
        }
        true
    }
}

/// `update_relationship` accepts only these two fields (§4.4); presence
/// of anything else is the caller's `InvalidArgument` to raise, so the
/// patch type only models what's legal.
#[derive(Debug, Clone, Default)]
pub struct RelationshipPatch {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Full set of creation-required fields, used both for a fresh create
/// and for the upsert-on-unknown-id path of `update_relationship`.
#[derive(Debug, Clone)]
pub struct RelationshipSpec {
    pub id: String,
    pub name: String,
    pub related_entity_id: String,
    pub start: String,
    pub end: Option<String>,
    pub direction: Direction,
}

impl From<RelationshipSpec> for Relationship {
    fn from(spec: RelationshipSpec) -> Self {
        Relationship {
            id: spec.id,
            name: spec.name,
            related_entity_id: spec.related_entity_id,
            start: spec.start,
            end: spec.end,
            direction: spec.direction,
        }
    }
}
