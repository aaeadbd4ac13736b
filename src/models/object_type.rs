// Object type schemas - operator-authored record shapes
// Field definitions use a builder pattern for schema authoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field types a record value may conform to. The serialized tag is the
/// wire contract for the corresponding `field_data` value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    LongText,
    RichText,
    Number,
    Date,
    Email,
    Url,
    Boolean,
    MultiSelect,
    File,
    Location,
    Relationship,
    Color,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::LongText => "longtext",
            FieldType::RichText => "richtext",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Boolean => "boolean",
            FieldType::MultiSelect => "multiselect",
            FieldType::File => "file",
            FieldType::Location => "location",
            FieldType::Relationship => "relationship",
            FieldType::Color => "color",
        }
    }
}

/// Per-field validators applied on top of the type conformance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValidator {
    MinLength(usize),
    MaxLength(usize),
    Pattern(String),
    Range(f64, f64),
}

/// A single field of an object type. The `id` is the stable key into a
/// record's `field_data` map and is never reused after deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub validators: Vec<FieldValidator>,
    /// Allowed options for multiselect fields.
    #[serde(default)]
    pub options: Vec<String>,
    /// Target object type for relationship fields.
    #[serde(default)]
    pub target_object_type_id: Option<String>,
    /// Relationship fields: whether the value may be a list of ids.
    #[serde(default)]
    pub allow_multiple: bool,
}

impl FieldDefinition {
    pub fn new(id: &str, name: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            field_type,
            required: false,
            validators: Vec::new(),
            options: Vec::new(),
            target_object_type_id: None,
            allow_multiple: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn validate(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn options(mut self, options: Vec<&str>) -> Self {
        self.options = options.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn target(mut self, object_type_id: &str) -> Self {
        self.target_object_type_id = Some(object_type_id.to_string());
        self
    }

    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }
}

/// Which fields the presentation layer renders as primary/secondary.
/// The engine only keeps these pointing at valid field ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub primary_field_id: Option<String>,
    #[serde(default)]
    pub secondary_field_id: Option<String>,
}

/// A runtime-defined schema for a kind of record.
///
/// Identity is immutable once records reference it; types are
/// soft-deactivated (`is_active = false`) instead of hard-deleted while
/// records remain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectType {
    pub id: String,
    pub wall_id: String,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    /// Relationship definitions records of this type may participate in.
    #[serde(default)]
    pub relationship_definition_ids: Vec<String>,
    #[serde(default)]
    pub display_settings: DisplaySettings,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ObjectType {
    pub fn field(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == field_id)
    }
}
