// Data model - schemas, records, and relationship edges

pub mod item;
pub mod object_type;
pub mod relationship;

pub use item::{FieldData, Item, ItemImage};
pub use object_type::{
    DisplaySettings, FieldDefinition, FieldType, FieldValidator, ObjectType,
};
pub use relationship::{ObjectRelationship, RelationshipDefinition, RelationshipType};
