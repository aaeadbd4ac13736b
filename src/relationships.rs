// Relationship store - CRUD over edges between items with cardinality
// enforcement, bidirectional mirroring, and cascade delete.

use chrono::Utc;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ObjectRelationship, RelationshipDefinition, RelationshipType};
use crate::registry::SchemaRegistry;
use crate::storage::{
    collections, from_document, to_document, DocumentQuery, DocumentStore, SortDirection,
};

/// Input for creating an edge between two items.
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub wall_id: String,
    pub from_item_id: String,
    pub to_item_id: String,
    pub relationship_definition_id: String,
    pub metadata: Option<Value>,
    pub created_by: Option<String>,
}

/// What a `remove_all_for_item` sweep actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    pub edges_removed: usize,
    pub items_cascade_deleted: usize,
}

/// Outcome of a bidirectional reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub edges_scanned: usize,
    /// Mirror edges written to repair asymmetric pairs.
    pub repaired: Vec<ObjectRelationship>,
}

pub struct RelationshipStore {
    store: Arc<dyn DocumentStore>,
    registry: Arc<SchemaRegistry>,
}

impl RelationshipStore {
    pub fn new(store: Arc<dyn DocumentStore>, registry: Arc<SchemaRegistry>) -> Self {
        Self { store, registry }
    }

    /// Create an edge, enforcing the self-loop and cardinality rules of
    /// its definition. For a bidirectional definition both directions are
    /// checked up front, then the forward edge and its mirror are written
    /// as two independent documents (see `reconcile_bidirectional` for the
    /// repair path when a crash lands between the two writes).
    pub async fn create_edge(&self, new_edge: NewEdge) -> AppResult<ObjectRelationship> {
        if new_edge.from_item_id == new_edge.to_item_id {
            return Err(AppError::ConstraintViolation(format!(
                "Self-loops are not allowed: item {} cannot relate to itself",
                new_edge.from_item_id
            )));
        }

        let definition = self
            .registry
            .get_relationship_definition(&new_edge.relationship_definition_id)
            .await?;

        for item_id in [&new_edge.from_item_id, &new_edge.to_item_id] {
            if self
                .store
                .get(collections::WALL_ITEMS, item_id)
                .await?
                .is_none()
            {
                return Err(AppError::NotFound(format!("Item {} not found", item_id)));
            }
        }

        self.check_cardinality(&new_edge.from_item_id, &new_edge.to_item_id, &definition)
            .await?;
        if definition.bidirectional {
            self.check_cardinality(&new_edge.to_item_id, &new_edge.from_item_id, &definition)
                .await?;
        }

        let edge = ObjectRelationship {
            id: Uuid::new_v4().to_string(),
            wall_id: new_edge.wall_id.clone(),
            from_item_id: new_edge.from_item_id.clone(),
            to_item_id: new_edge.to_item_id.clone(),
            relationship_definition_id: definition.id.clone(),
            metadata: new_edge.metadata.clone(),
            created_at: Utc::now(),
            created_by: new_edge.created_by.clone(),
        };
        self.store
            .put(
                collections::OBJECT_RELATIONSHIPS,
                &edge.id,
                to_document(&edge)?,
            )
            .await?;
        info!(
            "create_edge: {} -> {} under '{}' ({})",
            edge.from_item_id, edge.to_item_id, definition.name, edge.id
        );

        if definition.bidirectional {
            let mirror = ObjectRelationship {
                id: Uuid::new_v4().to_string(),
                wall_id: new_edge.wall_id,
                from_item_id: new_edge.to_item_id,
                to_item_id: new_edge.from_item_id,
                relationship_definition_id: definition.id.clone(),
                metadata: new_edge.metadata,
                created_at: Utc::now(),
                created_by: new_edge.created_by,
            };
            self.store
                .put(
                    collections::OBJECT_RELATIONSHIPS,
                    &mirror.id,
                    to_document(&mirror)?,
                )
                .await?;
            info!(
                "create_edge: mirrored {} -> {} under '{}' ({})",
                mirror.from_item_id, mirror.to_item_id, definition.name, mirror.id
            );
        }

        Ok(edge)
    }

    /// Reject the edge if an existing edge from the same source violates
    /// the definition's cardinality. The conflicting edge is named so the
    /// caller can act on it.
    async fn check_cardinality(
        &self,
        from_item_id: &str,
        to_item_id: &str,
        definition: &RelationshipDefinition,
    ) -> AppResult<()> {
        let existing = self.edges_from(from_item_id, &definition.id).await?;
        match definition.relationship_type {
            RelationshipType::OneToOne => {
                if let Some(conflict) = existing.first() {
                    return Err(AppError::ConstraintViolation(format!(
                        "One-to-one definition '{}' already links item {} (edge {} -> {})",
                        definition.name, from_item_id, conflict.id, conflict.to_item_id
                    )));
                }
            }
            RelationshipType::OneToMany => {
                if let Some(duplicate) = existing.iter().find(|e| e.to_item_id == to_item_id) {
                    return Err(AppError::ConstraintViolation(format!(
                        "Definition '{}' already links {} to {} (edge {})",
                        definition.name, from_item_id, to_item_id, duplicate.id
                    )));
                }
            }
            RelationshipType::ManyToMany => {}
        }
        Ok(())
    }

    async fn edges_from(
        &self,
        from_item_id: &str,
        definition_id: &str,
    ) -> AppResult<Vec<ObjectRelationship>> {
        let docs = self
            .store
            .query(
                collections::OBJECT_RELATIONSHIPS,
                DocumentQuery::new()
                    .filter("from_item_id", from_item_id)
                    .filter("relationship_definition_id", definition_id)
                    .order_by("created_at", SortDirection::Ascending),
            )
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    pub async fn find_edge(&self, id: &str) -> AppResult<Option<ObjectRelationship>> {
        match self.store.get(collections::OBJECT_RELATIONSHIPS, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Delete an edge by id. For a bidirectional definition the mirror
    /// edge goes too; leaving it behind would be exactly the asymmetric
    /// state reconciliation exists to repair.
    pub async fn delete_edge(&self, id: &str) -> AppResult<bool> {
        let Some(edge) = self.find_edge(id).await? else {
            return Ok(false);
        };
        let deleted = self
            .store
            .delete(collections::OBJECT_RELATIONSHIPS, id)
            .await?;
        if !deleted {
            return Ok(false);
        }
        info!(
            "delete_edge: removed {} ({} -> {})",
            edge.id, edge.from_item_id, edge.to_item_id
        );

        let definition = self
            .registry
            .find_relationship_definition(&edge.relationship_definition_id)
            .await?;
        if definition.map(|d| d.bidirectional).unwrap_or(false) {
            let mirrors = self
                .edges_from(&edge.to_item_id, &edge.relationship_definition_id)
                .await?;
            if let Some(mirror) = mirrors.iter().find(|m| m.to_item_id == edge.from_item_id) {
                self.store
                    .delete(collections::OBJECT_RELATIONSHIPS, &mirror.id)
                    .await?;
                info!("delete_edge: removed mirror {}", mirror.id);
            } else {
                warn!(
                    "delete_edge: no mirror found for bidirectional edge {} ({} -> {})",
                    edge.id, edge.from_item_id, edge.to_item_id
                );
            }
        }
        Ok(true)
    }

    pub async fn list_for_wall(&self, wall_id: &str) -> AppResult<Vec<ObjectRelationship>> {
        let docs = self
            .store
            .query(
                collections::OBJECT_RELATIONSHIPS,
                DocumentQuery::new()
                    .filter("wall_id", wall_id)
                    .order_by("created_at", SortDirection::Ascending),
            )
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    /// Every edge touching the item in either role, de-duplicated by id.
    pub async fn list_for_item(&self, item_id: &str) -> AppResult<Vec<ObjectRelationship>> {
        let mut edges: Vec<ObjectRelationship> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for role in ["from_item_id", "to_item_id"] {
            let docs = self
                .store
                .query(
                    collections::OBJECT_RELATIONSHIPS,
                    DocumentQuery::new()
                        .filter(role, item_id)
                        .order_by("created_at", SortDirection::Ascending),
                )
                .await?;
            for doc in docs {
                let edge: ObjectRelationship = from_document(doc)?;
                if seen.insert(edge.id.clone()) {
                    edges.push(edge);
                }
            }
        }
        Ok(edges)
    }

    /// Strip every edge touching the item, used by the record store before
    /// it deletes the record itself. Definitions with cascade_delete also
    /// delete the other endpoint's record, which queues that item for its
    /// own sweep; the visited set keeps cascade cycles from looping. A
    /// no-edge item is a successful no-op.
    pub async fn remove_all_for_item(&self, item_id: &str) -> AppResult<RemovalSummary> {
        let mut summary = RemovalSummary::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut pending = vec![item_id.to_string()];

        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for edge in self.list_for_item(&current).await? {
                if self
                    .store
                    .delete(collections::OBJECT_RELATIONSHIPS, &edge.id)
                    .await?
                {
                    summary.edges_removed += 1;
                }
                let definition = self
                    .registry
                    .find_relationship_definition(&edge.relationship_definition_id)
                    .await?;
                if definition.map(|d| d.cascade_delete).unwrap_or(false) {
                    let other = edge.other_endpoint(&current).to_string();
                    if !visited.contains(&other) {
                        if self.store.delete(collections::WALL_ITEMS, &other).await? {
                            summary.items_cascade_deleted += 1;
                            info!(
                                "remove_all_for_item: cascade deleted item {} via edge {}",
                                other, edge.id
                            );
                        }
                        pending.push(other);
                    }
                }
            }
        }

        info!(
            "remove_all_for_item: {} -> {} edges removed, {} items cascade deleted",
            item_id, summary.edges_removed, summary.items_cascade_deleted
        );
        Ok(summary)
    }

    /// Detect bidirectional definitions whose mirror edge is missing (a
    /// crash or concurrent delete between the two writes leaves this
    /// state). With `repair` the missing mirrors are written and reported;
    /// without it, any asymmetry is a `Conflict` error naming the pairs.
    pub async fn reconcile_bidirectional(
        &self,
        wall_id: &str,
        repair: bool,
    ) -> AppResult<ReconcileReport> {
        let definitions: HashMap<String, RelationshipDefinition> = self
            .registry
            .list_relationship_definitions(wall_id)
            .await?
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        let edges = self.list_for_wall(wall_id).await?;
        let mut present: HashSet<(String, String, String)> = edges
            .iter()
            .map(|e| {
                (
                    e.from_item_id.clone(),
                    e.to_item_id.clone(),
                    e.relationship_definition_id.clone(),
                )
            })
            .collect();

        let mut report = ReconcileReport {
            edges_scanned: edges.len(),
            repaired: Vec::new(),
        };
        let mut conflicts: Vec<String> = Vec::new();

        for edge in &edges {
            let bidirectional = definitions
                .get(&edge.relationship_definition_id)
                .map(|d| d.bidirectional)
                .unwrap_or(false);
            if !bidirectional {
                continue;
            }
            let mirror_key = (
                edge.to_item_id.clone(),
                edge.from_item_id.clone(),
                edge.relationship_definition_id.clone(),
            );
            if present.contains(&mirror_key) {
                continue;
            }
            if !repair {
                conflicts.push(format!(
                    "{} -> {} under {} has no mirror",
                    edge.from_item_id, edge.to_item_id, edge.relationship_definition_id
                ));
                continue;
            }
            let mirror = ObjectRelationship {
                id: Uuid::new_v4().to_string(),
                wall_id: edge.wall_id.clone(),
                from_item_id: edge.to_item_id.clone(),
                to_item_id: edge.from_item_id.clone(),
                relationship_definition_id: edge.relationship_definition_id.clone(),
                metadata: edge.metadata.clone(),
                created_at: Utc::now(),
                created_by: edge.created_by.clone(),
            };
            self.store
                .put(
                    collections::OBJECT_RELATIONSHIPS,
                    &mirror.id,
                    to_document(&mirror)?,
                )
                .await?;
            warn!(
                "reconcile_bidirectional: repaired missing mirror {} -> {} under {}",
                mirror.from_item_id, mirror.to_item_id, mirror.relationship_definition_id
            );
            present.insert((
                mirror.from_item_id.clone(),
                mirror.to_item_id.clone(),
                mirror.relationship_definition_id.clone(),
            ));
            report.repaired.push(mirror);
        }

        if !conflicts.is_empty() {
            return Err(AppError::Conflict(format!(
                "Asymmetric bidirectional edges on wall {}: {}",
                wall_id,
                conflicts.join("; ")
            )));
        }
        Ok(report)
    }
}
