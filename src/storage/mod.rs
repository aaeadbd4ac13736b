// Document store abstraction - the persistence boundary of the engine.
// One collection per entity kind; documents are JSON keyed by entity id,
// with equality filters (wall_id first) and an order_by on timestamps.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{AppError, AppResult};

/// Collection names used by the engine.
pub mod collections {
    pub const OBJECT_TYPES: &str = "object_types";
    pub const WALL_ITEMS: &str = "wall_items";
    pub const OBJECT_RELATIONSHIPS: &str = "object_relationships";
    pub const RELATIONSHIP_DEFINITIONS: &str = "relationship_definitions";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Equality filter on a top-level document field.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<u32>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.filters
            .iter()
            .all(|f| document.get(&f.field) == Some(&f.value))
    }
}

/// Abstract document store: get/query/put/delete per collection, eventual
/// read-after-write consistency per document. Writes are last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allow downcasting to concrete store types.
    fn as_any(&self) -> &dyn std::any::Any;

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;
    async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()>;
    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool>;
    async fn query(&self, collection: &str, query: DocumentQuery) -> AppResult<Vec<Value>>;
}

/// Serialize an entity into its stored document form.
pub fn to_document<T: Serialize>(entity: &T) -> AppResult<Value> {
    serde_json::to_value(entity)
        .map_err(|e| AppError::SerializationError(format!("Failed to serialize document: {}", e)))
}

/// Decode a stored document back into an entity.
pub fn from_document<T: DeserializeOwned>(document: Value) -> AppResult<T> {
    serde_json::from_value(document)
        .map_err(|e| AppError::SerializationError(format!("Failed to decode document: {}", e)))
}

/// Ordering over JSON values for `order_by`: numbers numerically, strings
/// lexically (RFC 3339 timestamps sort chronologically), null first.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Apply order_by and limit to an already-filtered document set.
pub(crate) fn sort_and_limit(mut documents: Vec<Value>, query: &DocumentQuery) -> Vec<Value> {
    if let Some((field, direction)) = &query.order_by {
        documents.sort_by(|a, b| {
            let ordering = compare_values(
                a.get(field).unwrap_or(&Value::Null),
                b.get(field).unwrap_or(&Value::Null),
            );
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
    if let Some(limit) = query.limit {
        documents.truncate(limit as usize);
    }
    documents
}
