// Relationship model - definitions (edge kinds) and stored edges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Edge cardinality, enforced on the "from" role of every stored edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::OneToOne => "one-to-one",
            RelationshipType::OneToMany => "one-to-many",
            RelationshipType::ManyToMany => "many-to-many",
        }
    }
}

/// A named, typed edge kind between two object types, authored once per
/// wall and referenced by every edge of that kind.
///
/// A bidirectional definition is realized as two stored edges (forward and
/// mirror) sharing this definition's id, so cardinality applies
/// independently to each direction's "from" role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    pub id: String,
    pub wall_id: String,
    pub name: String,
    pub from_object_type_id: String,
    pub to_object_type_id: String,
    pub relationship_type: RelationshipType,
    pub bidirectional: bool,
    pub required: bool,
    pub cascade_delete: bool,
    pub created_at: DateTime<Utc>,
}

/// A stored edge between two items. Invariant: `from_item_id != to_item_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRelationship {
    pub id: String,
    pub wall_id: String,
    pub from_item_id: String,
    pub to_item_id: String,
    pub relationship_definition_id: String,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl ObjectRelationship {
    /// Whether the edge touches the given item in either role.
    pub fn touches(&self, item_id: &str) -> bool {
        self.from_item_id == item_id || self.to_item_id == item_id
    }

    /// The endpoint opposite to the given item id.
    pub fn other_endpoint(&self, item_id: &str) -> &str {
        if self.from_item_id == item_id {
            &self.to_item_id
        } else {
            &self.from_item_id
        }
    }
}
