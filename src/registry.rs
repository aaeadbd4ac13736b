// Schema registry - stores and serves object type definitions and the
// relationship definitions wired between them. Leaf dependency for every
// other service; reads vastly outnumber writes.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    DisplaySettings, FieldDefinition, ObjectType, RelationshipDefinition, RelationshipType,
};
use crate::storage::{
    collections, from_document, to_document, DocumentQuery, DocumentStore, SortDirection,
};

/// Input for authoring a new object type (templates produce these too).
#[derive(Debug, Clone)]
pub struct NewObjectType {
    pub wall_id: String,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub display_settings: DisplaySettings,
    pub sort_order: i32,
}

/// Input for authoring a relationship definition between two object types.
#[derive(Debug, Clone)]
pub struct NewRelationshipDefinition {
    pub wall_id: String,
    pub name: String,
    pub from_object_type_id: String,
    pub to_object_type_id: String,
    pub relationship_type: RelationshipType,
    pub bidirectional: bool,
    pub required: bool,
    pub cascade_delete: bool,
}

pub struct SchemaRegistry {
    store: Arc<dyn DocumentStore>,
}

impl SchemaRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // --- object types ---

    pub async fn create_object_type(&self, draft: NewObjectType) -> AppResult<ObjectType> {
        let now = Utc::now();
        let mut object_type = ObjectType {
            id: Uuid::new_v4().to_string(),
            wall_id: draft.wall_id,
            name: draft.name,
            fields: draft.fields,
            relationship_definition_ids: Vec::new(),
            display_settings: draft.display_settings,
            is_active: true,
            sort_order: draft.sort_order,
            created_at: now,
            updated_at: now,
        };
        sanitize_display_settings(&mut object_type);
        self.store
            .put(
                collections::OBJECT_TYPES,
                &object_type.id,
                to_document(&object_type)?,
            )
            .await?;
        info!(
            "create_object_type: '{}' ({}) on wall {}",
            object_type.name, object_type.id, object_type.wall_id
        );
        Ok(object_type)
    }

    pub async fn find_object_type(&self, id: &str) -> AppResult<Option<ObjectType>> {
        match self.store.get(collections::OBJECT_TYPES, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get_object_type(&self, id: &str) -> AppResult<ObjectType> {
        self.find_object_type(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Object type {} not found", id)))
    }

    pub async fn list_for_wall(&self, wall_id: &str) -> AppResult<Vec<ObjectType>> {
        let docs = self
            .store
            .query(
                collections::OBJECT_TYPES,
                DocumentQuery::new()
                    .filter("wall_id", wall_id)
                    .order_by("created_at", SortDirection::Ascending),
            )
            .await?;
        let mut types = docs
            .into_iter()
            .map(from_document::<ObjectType>)
            .collect::<AppResult<Vec<_>>>()?;
        types.sort_by_key(|t| t.sort_order);
        Ok(types)
    }

    /// Replace an object type definition. Removing a field id that stored
    /// records still use is migration work, not an edit; the removal is
    /// allowed but logged, and stale keys stay present unvalidated.
    pub async fn update_object_type(&self, mut object_type: ObjectType) -> AppResult<ObjectType> {
        let existing = self.get_object_type(&object_type.id).await?;
        for old_field in &existing.fields {
            if object_type.field(&old_field.id).is_none() {
                warn!(
                    "update_object_type: field {} ('{}') removed from type {}; stale record keys remain unvalidated",
                    old_field.id, old_field.name, object_type.id
                );
            }
        }
        object_type.created_at = existing.created_at;
        object_type.updated_at = Utc::now();
        sanitize_display_settings(&mut object_type);
        self.store
            .put(
                collections::OBJECT_TYPES,
                &object_type.id,
                to_document(&object_type)?,
            )
            .await?;
        Ok(object_type)
    }

    /// Soft-deactivate: the type stops accepting new records but stays
    /// resolvable for the records that already reference it.
    pub async fn deactivate_object_type(&self, id: &str) -> AppResult<ObjectType> {
        let mut object_type = self.get_object_type(id).await?;
        object_type.is_active = false;
        object_type.updated_at = Utc::now();
        self.store
            .put(collections::OBJECT_TYPES, id, to_document(&object_type)?)
            .await?;
        info!("deactivate_object_type: {} deactivated", id);
        Ok(object_type)
    }

    /// Hard delete, refused while any record references the type.
    pub async fn delete_object_type(&self, id: &str) -> AppResult<()> {
        let object_type = self.get_object_type(id).await?;
        let referencing = self
            .store
            .query(
                collections::WALL_ITEMS,
                DocumentQuery::new()
                    .filter("wall_id", object_type.wall_id.as_str())
                    .filter("object_type_id", id)
                    .limit(1),
            )
            .await?;
        if !referencing.is_empty() {
            return Err(AppError::ConstraintViolation(format!(
                "Object type {} still has records; deactivate it instead",
                id
            )));
        }
        self.store.delete(collections::OBJECT_TYPES, id).await?;
        info!("delete_object_type: {} removed", id);
        Ok(())
    }

    // --- relationship definitions ---

    pub async fn create_relationship_definition(
        &self,
        draft: NewRelationshipDefinition,
    ) -> AppResult<RelationshipDefinition> {
        let from_type = self.get_object_type(&draft.from_object_type_id).await?;
        let to_type = self.get_object_type(&draft.to_object_type_id).await?;

        let definition = RelationshipDefinition {
            id: Uuid::new_v4().to_string(),
            wall_id: draft.wall_id,
            name: draft.name,
            from_object_type_id: draft.from_object_type_id,
            to_object_type_id: draft.to_object_type_id,
            relationship_type: draft.relationship_type,
            bidirectional: draft.bidirectional,
            required: draft.required,
            cascade_delete: draft.cascade_delete,
            created_at: Utc::now(),
        };
        self.store
            .put(
                collections::RELATIONSHIP_DEFINITIONS,
                &definition.id,
                to_document(&definition)?,
            )
            .await?;

        // The owning types advertise the definitions their records may use:
        // the from side always, the to side when the edge mirrors back.
        self.link_definition(from_type, &definition.id).await?;
        if definition.bidirectional && definition.from_object_type_id != definition.to_object_type_id
        {
            self.link_definition(to_type, &definition.id).await?;
        }

        info!(
            "create_relationship_definition: '{}' ({}) {} -> {} [{}{}]",
            definition.name,
            definition.id,
            definition.from_object_type_id,
            definition.to_object_type_id,
            definition.relationship_type.as_str(),
            if definition.bidirectional {
                ", bidirectional"
            } else {
                ""
            }
        );
        Ok(definition)
    }

    async fn link_definition(&self, mut object_type: ObjectType, definition_id: &str) -> AppResult<()> {
        if !object_type
            .relationship_definition_ids
            .iter()
            .any(|d| d == definition_id)
        {
            object_type
                .relationship_definition_ids
                .push(definition_id.to_string());
            object_type.updated_at = Utc::now();
            self.store
                .put(
                    collections::OBJECT_TYPES,
                    &object_type.id,
                    to_document(&object_type)?,
                )
                .await?;
        }
        Ok(())
    }

    pub async fn find_relationship_definition(
        &self,
        id: &str,
    ) -> AppResult<Option<RelationshipDefinition>> {
        match self
            .store
            .get(collections::RELATIONSHIP_DEFINITIONS, id)
            .await?
        {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get_relationship_definition(&self, id: &str) -> AppResult<RelationshipDefinition> {
        self.find_relationship_definition(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Relationship definition {} not found", id)))
    }

    pub async fn list_relationship_definitions(
        &self,
        wall_id: &str,
    ) -> AppResult<Vec<RelationshipDefinition>> {
        let docs = self
            .store
            .query(
                collections::RELATIONSHIP_DEFINITIONS,
                DocumentQuery::new()
                    .filter("wall_id", wall_id)
                    .order_by("created_at", SortDirection::Ascending),
            )
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    /// Remove a definition, refused while stored edges reference it.
    pub async fn delete_relationship_definition(&self, id: &str) -> AppResult<()> {
        let definition = self.get_relationship_definition(id).await?;
        let referencing = self
            .store
            .query(
                collections::OBJECT_RELATIONSHIPS,
                DocumentQuery::new()
                    .filter("wall_id", definition.wall_id.as_str())
                    .filter("relationship_definition_id", id)
                    .limit(1),
            )
            .await?;
        if !referencing.is_empty() {
            return Err(AppError::ConstraintViolation(format!(
                "Relationship definition {} still has edges",
                id
            )));
        }
        self.store
            .delete(collections::RELATIONSHIP_DEFINITIONS, id)
            .await?;
        Ok(())
    }
}

/// A display-settings sanity pass: both pointers must name existing field
/// ids; broken pointers are dropped rather than served.
pub fn sanitize_display_settings(object_type: &mut ObjectType) {
    let known = |fields: &[FieldDefinition], id: &Option<String>| {
        id.as_ref()
            .map(|i| fields.iter().any(|f| &f.id == i))
            .unwrap_or(true)
    };
    if !known(
        &object_type.fields,
        &object_type.display_settings.primary_field_id,
    ) {
        object_type.display_settings.primary_field_id = None;
    }
    if !known(
        &object_type.fields,
        &object_type.display_settings.secondary_field_id,
    ) {
        object_type.display_settings.secondary_field_id = None;
    }
}
