//! C4: graph store adapter — entity identity and relationship topology
//! (§4.4). The concrete wire protocol to an external graph engine is out
//! of scope per §1; `GraphStore` is the trait boundary the dispatcher
//! and service depend on, in the shape of `entity-gateway`'s own
//! `SearchIndex` trait (`index/traits.rs`): a small async interface with
//! one in-process reference implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{is_blank, Direction, Kind, Relationship, RelationshipFilter, TimeBoundedValue};
use crate::{EntityError, Result};

/// The graph-side identity record: everything the node itself owns,
/// independent of relationships and attributes (§3).
#[derive(Debug, Clone)]
pub struct GraphEntityRecord {
    pub id: String,
    pub kind: Kind,
    pub name: TimeBoundedValue<String>,
    pub created: String,
    pub terminated: Option<String>,
}

/// Fields `update_entity` may set. A `Some(_)` in `kind` is always
/// rejected — present only so the adapter can report exactly which
/// field the caller tried to mutate (§4.4).
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub kind: Option<Kind>,
    pub name: Option<TimeBoundedValue<String>>,
    pub created: Option<String>,
    pub terminated: Option<String>,
}

/// `filter_entities`'s kind selector: major required, minor optional —
/// when minor is absent, all minors of that major match (§4.4).
#[derive(Debug, Clone)]
pub struct KindFilter {
    pub major: String,
    pub minor: Option<String>,
}

/// Everything `update_relationship` might carry on the wire. Whether a
/// given field is legal depends on whether the target relationship
/// already exists: on an existing relationship only `start`/`end` may
/// be present; on an unknown id, `name`/`related_entity_id`/`start`
/// (and optionally `direction`) are required to upsert one (§3, §4.4).
#[derive(Debug, Clone, Default)]
pub struct RelationshipUpdateInput {
    pub name: Option<String>,
    pub related_entity_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub direction: Option<Direction>,
}

struct StoredRelationship {
    source_id: String,
    rel: Relationship,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn create_entity(
        &self,
        id: &str,
        kind: Kind,
        name: TimeBoundedValue<String>,
        created: String,
    ) -> Result<()>;

    async fn read_entity(&self, id: &str) -> Result<GraphEntityRecord>;

    async fn update_entity(&self, id: &str, patch: EntityPatch) -> Result<()>;

    async fn delete_entity(&self, id: &str) -> Result<()>;

    async fn create_relationship(&self, source_id: &str, rel: Relationship) -> Result<()>;

    async fn read_relationship(&self, id: &str) -> Result<Relationship>;

    async fn delete_relationship(&self, id: &str) -> Result<()>;

    /// Upsert semantics per §3: an `id` unknown to the store creates
    /// the relationship provided `input` supplies every creation-
    /// required field; a known `id` only accepts `start`/`end`.
    async fn update_relationship(
        &self,
        source_id: &str,
        id: &str,
        input: RelationshipUpdateInput,
    ) -> Result<Relationship>;

    /// All relationships stored under `entity_id`, direction normalized
    /// to `OUTGOING` on return (§4.4 design choice).
    async fn read_relationships(&self, entity_id: &str) -> Result<Vec<Relationship>>;

    async fn read_filtered_relationships(
        &self,
        entity_id: &str,
        filters: &RelationshipFilter,
        active_at: Option<&str>,
    ) -> Result<Vec<Relationship>>;

    async fn filter_entities(
        &self,
        kind: Option<KindFilter>,
        id: Option<&str>,
    ) -> Result<Vec<GraphEntityRecord>>;
}

/// In-process reference adapter. Fully implements the filters, the
/// temporal predicate, relationship id uniqueness, and the direction
/// normalization rule; it stands in for whatever concrete graph engine
/// a deployment wires up (§1 frames the concrete engine as out of
/// scope — only the interface it must expose is specified).
#[derive(Default)]
pub struct InMemoryGraphStore {
    entities: RwLock<HashMap<String, GraphEntityRecord>>,
    relationships: RwLock<HashMap<String, StoredRelationship>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_create_preconditions(
        id: &str,
        kind: &Kind,
        name: &TimeBoundedValue<String>,
        created: &str,
    ) -> Result<()> {
        let mut missing = Vec::new();
        if is_blank(Some(id)) {
            missing.push("id");
        }
        if is_blank(Some(&kind.major)) {
            missing.push("kind.major");
        }
        if is_blank(Some(&kind.minor)) {
            missing.push("kind.minor");
        }
        if is_blank(Some(&name.payload)) {
            missing.push("name.value");
        }
        if is_blank(Some(created)) {
            missing.push("created");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EntityError::InvalidArgument(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn create_entity(
        &self,
        id: &str,
        kind: Kind,
        name: TimeBoundedValue<String>,
        created: String,
    ) -> Result<()> {
        Self::validate_create_preconditions(id, &kind, &name, &created)?;

        let mut entities = self.entities.write().await;
        if entities.contains_key(id) {
            return Err(EntityError::AlreadyExists(format!(
                "entity '{id}' already exists"
            )));
        }
        entities.insert(
            id.to_string(),
            GraphEntityRecord {
                id: id.to_string(),
                kind,
                name,
                created,
                terminated: None,
            },
        );
        Ok(())
    }

    async fn read_entity(&self, id: &str) -> Result<GraphEntityRecord> {
        self.entities
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EntityError::NotFound(format!("entity '{id}' not found")))
    }

    async fn update_entity(&self, id: &str, patch: EntityPatch) -> Result<()> {
        if patch.kind.is_some() {
            return Err(EntityError::InvalidArgument(
                "kind is immutable after creation".to_string(),
            ));
        }

        let mut entities = self.entities.write().await;
        let record = entities
            .get_mut(id)
            .ok_or_else(|| EntityError::NotFound(format!("entity '{id}' not found")))?;

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(created) = patch.created {
            record.created = created;
        }
        if let Some(terminated) = patch.terminated {
            record.terminated = Some(terminated);
        }
        Ok(())
    }

    async fn delete_entity(&self, id: &str) -> Result<()> {
        let relationships = self.relationships.read().await;
        let referenced = relationships
            .values()
            .any(|stored| stored.source_id == id || stored.rel.related_entity_id == id);
        if referenced {
            return Err(EntityError::DependencyConflict(format!(
                "entity '{id}' still participates in relationships"
            )));
        }
        drop(relationships);

        let mut entities = self.entities.write().await;
        if entities.remove(id).is_none() {
            return Err(EntityError::NotFound(format!("entity '{id}' not found")));
        }
        Ok(())
    }

    async fn create_relationship(&self, source_id: &str, rel: Relationship) -> Result<()> {
        if is_blank(Some(&rel.name))
            || is_blank(Some(&rel.related_entity_id))
            || is_blank(Some(&rel.start))
        {
            return Err(EntityError::InvalidArgument(
                "relationship requires name, related_entity_id, and start".to_string(),
            ));
        }

        let entities = self.entities.read().await;
        if !entities.contains_key(source_id) {
            return Err(EntityError::InvalidArgument(format!(
                "source entity '{source_id}' does not exist"
            )));
        }
        if !entities.contains_key(&rel.related_entity_id) {
            return Err(EntityError::InvalidArgument(format!(
                "related entity '{}' does not exist",
                rel.related_entity_id
            )));
        }
        drop(entities);

        let mut relationships = self.relationships.write().await;
        if relationships.contains_key(&rel.id) {
            return Err(EntityError::AlreadyExists(format!(
                "relationship '{}' already exists",
                rel.id
            )));
        }
        relationships.insert(
            rel.id.clone(),
            StoredRelationship {
                source_id: source_id.to_string(),
                rel,
            },
        );
        Ok(())
    }

    async fn read_relationship(&self, id: &str) -> Result<Relationship> {
        self.relationships
            .read()
            .await
            .get(id)
            .map(|stored| stored.rel.clone())
            .ok_or_else(|| EntityError::NotFound(format!("relationship '{id}' not found")))
    }

    async fn delete_relationship(&self, id: &str) -> Result<()> {
        if self.relationships.write().await.remove(id).is_none() {
            return Err(EntityError::NotFound(format!(
                "relationship '{id}' not found"
            )));
        }
        Ok(())
    }

    async fn update_relationship(
        &self,
        source_id: &str,
        id: &str,
        input: RelationshipUpdateInput,
    ) -> Result<Relationship> {
        let mut relationships = self.relationships.write().await;

        if let Some(stored) = relationships.get_mut(id) {
            let mut offending = Vec::new();
            if input.name.is_some() {
                offending.push("name");
            }
            if input.related_entity_id.is_some() {
                offending.push("related_entity_id");
            }
            if input.direction.is_some() {
                offending.push("direction");
            }
            if !offending.is_empty() {
                return Err(EntityError::InvalidArgument(format!(
                    "immutable relationship field(s) present: {}",
                    offending.join(", ")
                )));
            }

            if let Some(start) = input.start {
                stored.rel.start = start;
            }
            if let Some(end) = input.end {
                stored.rel.end = Some(end);
            }
            return Ok(stored.rel.clone());
        }
        drop(relationships);

        // Upsert: id unknown, every creation-required field must be present.
        let name = input.name.ok_or_else(|| {
            EntityError::InvalidArgument("name is required to create relationship".to_string())
        })?;
        let related_entity_id = input.related_entity_id.ok_or_else(|| {
            EntityError::InvalidArgument(
                "related_entity_id is required to create relationship".to_string(),
            )
        })?;
        let start = input.start.ok_or_else(|| {
            EntityError::InvalidArgument("start is required to create relationship".to_string())
        })?;
        let direction = input.direction.unwrap_or(Direction::Outgoing);

        let rel = Relationship {
            id: id.to_string(),
            name,
            related_entity_id,
            start,
            end: input.end,
            direction,
        };
        self.create_relationship(source_id, rel.clone()).await?;
        Ok(rel)
    }

    async fn read_relationships(&self, entity_id: &str) -> Result<Vec<Relationship>> {
        let relationships = self.relationships.read().await;
        Ok(relationships
            .values()
            .filter(|stored| stored.source_id == entity_id)
            .map(|stored| {
                let mut rel = stored.rel.clone();
                rel.direction = Direction::Outgoing;
                rel
            })
            .collect())
    }

    async fn read_filtered_relationships(
        &self,
        entity_id: &str,
        filters: &RelationshipFilter,
        active_at: Option<&str>,
    ) -> Result<Vec<Relationship>> {
        let relationships = self.relationships.read().await;
        Ok(relationships
            .values()
            .filter(|stored| {
                stored.source_id == entity_id || stored.rel.related_entity_id == entity_id
            })
            .map(|stored| {
                let mut rel = stored.rel.clone();
                rel.direction = if stored.source_id == entity_id {
                    Direction::Outgoing
                } else {
                    Direction::Incoming
                };
                rel
            })
            .filter(|rel| filters.matches(rel))
            .filter(|rel| active_at.map(|at| rel.active_at(at)).unwrap_or(true))
            .collect())
    }

    async fn filter_entities(
        &self,
        kind: Option<KindFilter>,
        id: Option<&str>,
    ) -> Result<Vec<GraphEntityRecord>> {
        let entities = self.entities.read().await;

        // The (id-only) path short-circuits and ignores every other filter.
        if let Some(id) = id {
            return Ok(entities.get(id).cloned().into_iter().collect());
        }

        let Some(kind) = kind else {
            return Ok(entities.values().cloned().collect());
        };

        Ok(entities
            .values()
            .filter(|e| e.kind.major == kind.major)
            .filter(|e| kind.minor.as_ref().map(|m| &e.kind.minor == m).unwrap_or(true))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind() -> Kind {
        Kind::new("Person", "Minister")
    }

    fn name(value: &str) -> TimeBoundedValue<String> {
        TimeBoundedValue::new("2025-03-18T00:00:00Z", None, value.to_string())
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("e1", kind(), name("John Doe"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        let record = store.read_entity("e1").await.unwrap();
        assert_eq!(record.name.payload, "John Doe");
        assert_eq!(record.kind, kind());
    }

    #[tokio::test]
    async fn duplicate_create_is_already_exists_and_leaves_original_untouched() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("e1", kind(), name("John Doe"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        let err = store
            .create_entity(
                "e1",
                Kind::new("Organization", "Department"),
                name("Someone Else"),
                "2025-03-19T00:00:00Z".into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::AlreadyExists(_)));

        let record = store.read_entity("e1").await.unwrap();
        assert_eq!(record.name.payload, "John Doe");
    }

    #[tokio::test]
    async fn missing_required_fields_are_rejected() {
        let store = InMemoryGraphStore::new();
        let err = store
            .create_entity("", kind(), name("x"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn kind_is_immutable() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("e3", kind(), name("x"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        let err = store
            .update_entity(
                "e3",
                EntityPatch {
                    kind: Some(Kind::new("Organization", "Department")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::InvalidArgument(_)));

        let record = store.read_entity("e3").await.unwrap();
        assert_eq!(record.kind, kind());
    }

    #[tokio::test]
    async fn relationship_requires_both_endpoints_to_exist() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("a", kind(), name("A"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        let rel = Relationship {
            id: "r1".into(),
            name: "FRIEND".into(),
            related_entity_id: "b".into(),
            start: "2025-04-01T00:00:00Z".into(),
            end: None,
            direction: Direction::Outgoing,
        };
        let err = store.create_relationship("a", rel).await.unwrap_err();
        assert!(matches!(err, EntityError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn delete_entity_rejects_when_referenced() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("a", kind(), name("A"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();
        store
            .create_entity("b", kind(), name("B"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();
        store
            .create_relationship(
                "a",
                Relationship {
                    id: "r1".into(),
                    name: "FRIEND".into(),
                    related_entity_id: "b".into(),
                    start: "2025-04-01T00:00:00Z".into(),
                    end: None,
                    direction: Direction::Outgoing,
                },
            )
            .await
            .unwrap();

        let err = store.delete_entity("a").await.unwrap_err();
        assert!(matches!(err, EntityError::DependencyConflict(_)));
    }

    #[tokio::test]
    async fn immutable_relationship_field_rejected_on_update() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("a", kind(), name("A"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();
        store
            .create_entity("b", kind(), name("B"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();
        store
            .create_relationship(
                "a",
                Relationship {
                    id: "r1".into(),
                    name: "MANAGES".into(),
                    related_entity_id: "b".into(),
                    start: "2025-04-01T00:00:00Z".into(),
                    end: None,
                    direction: Direction::Outgoing,
                },
            )
            .await
            .unwrap();

        let err = store
            .update_relationship(
                "a",
                "r1",
                RelationshipUpdateInput {
                    name: Some("SUPERVISES".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::InvalidArgument(_)));

        let rel = store.read_relationship("r1").await.unwrap();
        assert_eq!(rel.name, "MANAGES");
    }

    #[tokio::test]
    async fn update_unknown_id_with_full_fields_upserts() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("a", kind(), name("A"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();
        store
            .create_entity("b", kind(), name("B"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        let rel = store
            .update_relationship(
                "a",
                "r-new",
                RelationshipUpdateInput {
                    name: Some("COLLEAGUE".into()),
                    related_entity_id: Some("b".into()),
                    start: Some("2025-04-02T00:00:00Z".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(rel.id, "r-new");

        let found = store.read_relationship("r-new").await.unwrap();
        assert_eq!(found.related_entity_id, "b");
    }

    #[tokio::test]
    async fn temporal_filter_matches_active_window() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("a", kind(), name("A"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();
        store
            .create_entity("b", kind(), name("B"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        store
            .create_relationship(
                "a",
                Relationship {
                    id: "r1".into(),
                    name: "FRIEND".into(),
                    related_entity_id: "b".into(),
                    start: "2025-04-01T00:00:00Z".into(),
                    end: None,
                    direction: Direction::Outgoing,
                },
            )
            .await
            .unwrap();
        store
            .create_relationship(
                "a",
                Relationship {
                    id: "r2".into(),
                    name: "COLLEAGUE".into(),
                    related_entity_id: "b".into(),
                    start: "2025-04-02T00:00:00Z".into(),
                    end: Some("2025-05-01T00:00:00Z".into()),
                    direction: Direction::Outgoing,
                },
            )
            .await
            .unwrap();

        let active = store
            .read_filtered_relationships("a", &RelationshipFilter::default(), Some("2025-05-03T00:00:00Z"))
            .await
            .unwrap();

        let ids: Vec<_> = active.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1"]);
    }

    #[tokio::test]
    async fn read_filtered_relationships_surfaces_incoming_edges() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("a", kind(), name("A"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();
        store
            .create_entity("b", kind(), name("B"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        // Owned by b, pointing at a — an INCOMING edge from a's perspective.
        store
            .create_relationship(
                "b",
                Relationship {
                    id: "r3".into(),
                    name: "MENTOR".into(),
                    related_entity_id: "a".into(),
                    start: "2025-04-01T00:00:00Z".into(),
                    end: None,
                    direction: Direction::Outgoing,
                },
            )
            .await
            .unwrap();

        let unfiltered = store
            .read_filtered_relationships("a", &RelationshipFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(unfiltered.len(), 1);
        assert_eq!(unfiltered[0].id, "r3");
        assert_eq!(unfiltered[0].direction, Direction::Incoming);

        let incoming_only = store
            .read_filtered_relationships(
                "a",
                &RelationshipFilter {
                    direction: Some(Direction::Incoming),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(incoming_only.len(), 1);
        assert_eq!(incoming_only[0].id, "r3");

        let outgoing_only = store
            .read_filtered_relationships(
                "a",
                &RelationshipFilter {
                    direction: Some(Direction::Outgoing),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert!(outgoing_only.is_empty());

        // From b's perspective the same edge is OUTGOING.
        let from_b = store
            .read_filtered_relationships("b", &RelationshipFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(from_b[0].direction, Direction::Outgoing);
    }

    #[tokio::test]
    async fn filter_entities_by_id_short_circuits() {
        let store = InMemoryGraphStore::new();
        store
            .create_entity("a", kind(), name("A"), "2025-03-18T00:00:00Z".into())
            .await
            .unwrap();

        let results = store
            .filter_entities(
                Some(KindFilter {
                    major: "Nonexistent".into(),
                    minor: None,
                }),
                Some("a"),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");
    }
}
