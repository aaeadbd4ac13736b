// Item model - a generic record conforming to an object type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untyped-at-rest field values keyed by `FieldDefinition.id`. Value shape
/// is typed by contract at the validation boundary; unknown keys are
/// preserved and left unvalidated.
pub type FieldData = serde_json::Map<String, Value>;

/// Reference to an externally stored asset. The engine never inspects
/// image bytes; it round-trips these entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// An instance of an object type. `object_type_id` is nullable only for
/// legacy, unmigrated records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub wall_id: String,
    pub object_type_id: Option<String>,
    #[serde(default)]
    pub field_data: FieldData,
    #[serde(default)]
    pub images: Vec<ItemImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl Item {
    /// First string field value, used as a fallback graph label.
    pub fn display_label(&self) -> &str {
        self.field_data
            .values()
            .find_map(|v| v.as_str())
            .unwrap_or(&self.id)
    }
}
