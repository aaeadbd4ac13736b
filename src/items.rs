// Item store - CRUD over generic records, validating against the owning
// object type before every write. Deletion strips relationship edges
// first; the reverse order would orphan edges.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{FieldData, Item, ItemImage};
use crate::registry::SchemaRegistry;
use crate::relationships::RelationshipStore;
use crate::storage::{
    collections, from_document, to_document, DocumentQuery, DocumentStore, SortDirection,
};
use crate::validation::{validate_field_data, validate_touched_fields};

/// Input for creating a record.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub wall_id: String,
    pub object_type_id: Option<String>,
    pub field_data: FieldData,
    pub images: Vec<ItemImage>,
    pub created_by: Option<String>,
}

impl NewItem {
    pub fn new(wall_id: &str, object_type_id: &str, field_data: FieldData) -> Self {
        Self {
            wall_id: wall_id.to_string(),
            object_type_id: Some(object_type_id.to_string()),
            field_data,
            images: Vec::new(),
            created_by: None,
        }
    }
}

pub struct ItemStore {
    store: Arc<dyn DocumentStore>,
    registry: Arc<SchemaRegistry>,
    relationships: Arc<RelationshipStore>,
}

impl ItemStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<SchemaRegistry>,
        relationships: Arc<RelationshipStore>,
    ) -> Self {
        Self {
            store,
            registry,
            relationships,
        }
    }

    /// Validate and persist a new record. Legacy records without an object
    /// type skip validation; typed records must pass every field check and
    /// their type must still be active.
    pub async fn create(&self, new_item: NewItem) -> AppResult<Item> {
        if let Some(object_type_id) = &new_item.object_type_id {
            let object_type = self.registry.get_object_type(object_type_id).await?;
            if !object_type.is_active {
                return Err(AppError::ConstraintViolation(format!(
                    "Object type {} is deactivated and accepts no new records",
                    object_type_id
                )));
            }
            let violations = validate_field_data(&new_item.field_data, &object_type);
            if !violations.is_empty() {
                return Err(AppError::Validation(violations));
            }
        }

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4().to_string(),
            wall_id: new_item.wall_id,
            object_type_id: new_item.object_type_id,
            field_data: new_item.field_data,
            images: new_item.images,
            created_at: now,
            updated_at: now,
            created_by: new_item.created_by.clone(),
            updated_by: new_item.created_by,
        };
        self.store
            .put(collections::WALL_ITEMS, &item.id, to_document(&item)?)
            .await?;
        info!(
            "create: item {} of type {:?} on wall {}",
            item.id, item.object_type_id, item.wall_id
        );
        Ok(item)
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<Item>> {
        match self.store.get(collections::WALL_ITEMS, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> AppResult<Item> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// Merge a partial field update into the record. Only the touched
    /// fields are revalidated unless the caller asks for a full pass.
    pub async fn update(
        &self,
        id: &str,
        partial_fields: FieldData,
        updated_by: Option<String>,
        revalidate_all: bool,
    ) -> AppResult<Item> {
        let mut item = self.get(id).await?;
        let touched: Vec<String> = partial_fields.keys().cloned().collect();
        for (key, value) in partial_fields {
            item.field_data.insert(key, value);
        }

        if let Some(object_type_id) = &item.object_type_id {
            let object_type = self.registry.get_object_type(object_type_id).await?;
            let violations = if revalidate_all {
                validate_field_data(&item.field_data, &object_type)
            } else {
                validate_touched_fields(&item.field_data, &object_type, &touched)
            };
            if !violations.is_empty() {
                return Err(AppError::Validation(violations));
            }
        }

        item.updated_at = Utc::now();
        item.updated_by = updated_by;
        self.store
            .put(collections::WALL_ITEMS, id, to_document(&item)?)
            .await?;
        info!("update: item {} ({} fields touched)", id, touched.len());
        Ok(item)
    }

    /// Replace the record's image references (assets live elsewhere; the
    /// engine only round-trips the references).
    pub async fn set_images(&self, id: &str, images: Vec<ItemImage>) -> AppResult<Item> {
        let mut item = self.get(id).await?;
        item.images = images;
        item.updated_at = Utc::now();
        self.store
            .put(collections::WALL_ITEMS, id, to_document(&item)?)
            .await?;
        Ok(item)
    }

    /// Delete a record. Edges are stripped first so no edge can dangle: a
    /// crash between the two steps leaves an edge-less record, which is
    /// safe, whereas the reverse order is not.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let summary = self.relationships.remove_all_for_item(id).await?;
        let deleted = self.store.delete(collections::WALL_ITEMS, id).await?;
        if deleted {
            info!(
                "delete: item {} removed ({} edges stripped, {} cascade deletions)",
                id, summary.edges_removed, summary.items_cascade_deleted
            );
        }
        Ok(deleted)
    }

    pub async fn list_by_wall(&self, wall_id: &str) -> AppResult<Vec<Item>> {
        let docs = self
            .store
            .query(
                collections::WALL_ITEMS,
                DocumentQuery::new()
                    .filter("wall_id", wall_id)
                    .order_by("created_at", SortDirection::Descending),
            )
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    pub async fn list_by_object_type(
        &self,
        wall_id: &str,
        object_type_id: &str,
    ) -> AppResult<Vec<Item>> {
        let docs = self
            .store
            .query(
                collections::WALL_ITEMS,
                DocumentQuery::new()
                    .filter("wall_id", wall_id)
                    .filter("object_type_id", object_type_id)
                    .order_by("created_at", SortDirection::Descending),
            )
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    /// Case-insensitive substring match over every field value, recursing
    /// into lists and objects. Not ranked; wall order is preserved.
    pub async fn search(&self, wall_id: &str, term: &str) -> AppResult<Vec<Item>> {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let items = self.list_by_wall(wall_id).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.field_data.values().any(|v| value_contains(v, &needle)))
            .collect())
    }
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Bool(b) => b.to_string() == needle,
        Value::Array(items) => items.iter().any(|v| value_contains(v, needle)),
        Value::Object(map) => map.values().any(|v| value_contains(v, needle)),
        Value::Null => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_matching_recurses_into_containers() {
        assert!(value_contains(&json!("Sgt. J. Smith"), "smith"));
        assert!(value_contains(&json!(["alpha", "bravo"]), "bravo"));
        assert!(value_contains(&json!({"address": "Fort Bragg"}), "bragg"));
        assert!(value_contains(&json!(1944), "194"));
        assert!(!value_contains(&json!(null), "anything"));
    }
}
