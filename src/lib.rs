// Wallgraph - dynamic object-type / relationship engine

// Data model - schemas, records, edges
pub mod models;

// Field validation against operator-authored schemas
pub mod validation;

// Document store abstraction and backends
pub mod storage;

// Schema registry - object types and relationship definitions
pub mod registry;

// Starter schema templates
pub mod templates;

// Record store
pub mod items;

// Relationship store - cardinality, mirroring, cascade delete
pub mod relationships;

// Graph engine - build, traverse, layout, statistics
pub mod graph;

// Aggregated views and cross-cutting operations
pub mod aggregate;

// Common utilities
pub mod config;
pub mod error;
pub mod observability;

// Re-exports for convenience
pub use aggregate::{AggregationService, BulkCreateOutcome, EnhancedItem, ItemFilter, ItemSortKey};
pub use config::{CacheConfig, EngineConfig, LayoutSettings};
pub use error::{AppError, AppResult, FieldViolation};
pub use items::{ItemStore, NewItem};
pub use models::{
    DisplaySettings, FieldData, FieldDefinition, FieldType, FieldValidator, Item, ItemImage,
    ObjectRelationship, ObjectType, RelationshipDefinition, RelationshipType,
};
pub use registry::{NewObjectType, NewRelationshipDefinition, SchemaRegistry};
pub use relationships::{NewEdge, ReconcileReport, RelationshipStore, RemovalSummary};
pub use storage::{DocumentQuery, DocumentStore, MemoryStore, SortDirection, SqliteStore};
