// Starter object type templates - the authored schemas operators can
// begin a wall with before customizing their own.

use crate::models::{DisplaySettings, FieldDefinition, FieldType, FieldValidator};
use crate::registry::NewObjectType;

/// A person record: name plus the biographical basics.
pub fn person(wall_id: &str) -> NewObjectType {
    NewObjectType {
        wall_id: wall_id.to_string(),
        name: "Person".to_string(),
        fields: vec![
            FieldDefinition::new("name", "Name", FieldType::Text)
                .required()
                .validate(FieldValidator::MaxLength(120)),
            FieldDefinition::new("biography", "Biography", FieldType::LongText),
            FieldDefinition::new("born", "Date of birth", FieldType::Date),
            FieldDefinition::new("email", "Email", FieldType::Email),
            FieldDefinition::new("photos", "Photos", FieldType::File),
        ],
        display_settings: DisplaySettings {
            primary_field_id: Some("name".to_string()),
            secondary_field_id: Some("born".to_string()),
        },
        sort_order: 0,
    }
}

/// An event record: a dated moment with a place attached.
pub fn event(wall_id: &str) -> NewObjectType {
    NewObjectType {
        wall_id: wall_id.to_string(),
        name: "Event".to_string(),
        fields: vec![
            FieldDefinition::new("title", "Title", FieldType::Text)
                .required()
                .validate(FieldValidator::MaxLength(200)),
            FieldDefinition::new("date", "Date", FieldType::Date).required(),
            FieldDefinition::new("description", "Description", FieldType::RichText),
            FieldDefinition::new("where", "Location", FieldType::Location),
        ],
        display_settings: DisplaySettings {
            primary_field_id: Some("title".to_string()),
            secondary_field_id: Some("date".to_string()),
        },
        sort_order: 1,
    }
}

/// A place record.
pub fn place(wall_id: &str) -> NewObjectType {
    NewObjectType {
        wall_id: wall_id.to_string(),
        name: "Place".to_string(),
        fields: vec![
            FieldDefinition::new("name", "Name", FieldType::Text)
                .required()
                .validate(FieldValidator::MaxLength(120)),
            FieldDefinition::new("coordinates", "Coordinates", FieldType::Location),
            FieldDefinition::new("website", "Website", FieldType::Url),
            FieldDefinition::new("marker_color", "Marker color", FieldType::Color),
        ],
        display_settings: DisplaySettings {
            primary_field_id: Some("name".to_string()),
            secondary_field_id: None,
        },
        sort_order: 2,
    }
}

/// Every built-in template for a wall, in display order.
pub fn all(wall_id: &str) -> Vec<NewObjectType> {
    vec![person(wall_id), event(wall_id), place(wall_id)]
}
