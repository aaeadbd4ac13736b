// Field validation - checks record values against an object type's
// field definitions. Pure functions; all violations are collected in a
// single pass so one correction round is enough.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::FieldViolation;
use crate::models::{FieldData, FieldDefinition, FieldType, FieldValidator, ObjectType};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://\S+$").unwrap());
static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").unwrap());

/// Validate a full record against every field of its object type.
/// Unknown keys in `field_data` are preserved but not validated.
pub fn validate_field_data(field_data: &FieldData, object_type: &ObjectType) -> Vec<FieldViolation> {
    validate_fields(field_data, object_type.fields.iter())
}

/// Validate only the named fields, used for partial updates. Fields not in
/// `touched` keep whatever state they had.
pub fn validate_touched_fields(
    field_data: &FieldData,
    object_type: &ObjectType,
    touched: &[String],
) -> Vec<FieldViolation> {
    validate_fields(
        field_data,
        object_type
            .fields
            .iter()
            .filter(|f| touched.iter().any(|t| t == &f.id)),
    )
}

fn validate_fields<'a>(
    field_data: &FieldData,
    fields: impl Iterator<Item = &'a FieldDefinition>,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    for field in fields {
        let value = field_data.get(&field.id);
        if value.map_or(true, is_empty) {
            if field.required {
                violations.push(FieldViolation::new(&field.id, &field.name, "is required"));
            }
            continue;
        }
        let value = value.unwrap_or(&Value::Null);
        check_type(field, value, &mut violations);
    }
    violations
}

/// Null, the empty string, and the empty list all count as "no value".
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_type(field: &FieldDefinition, value: &Value, violations: &mut Vec<FieldViolation>) {
    match field.field_type {
        FieldType::Text | FieldType::LongText | FieldType::RichText => {
            match value.as_str() {
                Some(s) => check_string_validators(field, s, violations),
                None => violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "must be a string",
                )),
            }
        }
        FieldType::Number => match numeric_value(value) {
            Some(n) => check_range_validators(field, n, violations),
            None => violations.push(FieldViolation::new(
                &field.id,
                &field.name,
                "must be a number",
            )),
        },
        FieldType::Date => {
            let valid = value
                .as_str()
                .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false);
            if !valid {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "must be an ISO-8601 date",
                ));
            }
        }
        FieldType::Email => {
            let valid = value.as_str().map(|s| EMAIL_RE.is_match(s)).unwrap_or(false);
            if !valid {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "must be a valid email address",
                ));
            }
        }
        FieldType::Url => {
            let valid = value.as_str().map(|s| URL_RE.is_match(s)).unwrap_or(false);
            if !valid {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "must be an absolute URL",
                ));
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "must be true or false",
                ));
            }
        }
        FieldType::MultiSelect => check_multiselect(field, value, violations),
        FieldType::File => check_file(field, value, violations),
        FieldType::Location => check_location(field, value, violations),
        FieldType::Relationship => check_relationship(field, value, violations),
        FieldType::Color => {
            let valid = value.as_str().map(|s| COLOR_RE.is_match(s)).unwrap_or(false);
            if !valid {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "must be a hex color",
                ));
            }
        }
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn check_string_validators(field: &FieldDefinition, s: &str, violations: &mut Vec<FieldViolation>) {
    for validator in &field.validators {
        match validator {
            FieldValidator::MinLength(min) => {
                if s.chars().count() < *min {
                    violations.push(FieldViolation::new(
                        &field.id,
                        &field.name,
                        format!("must be at least {} characters", min),
                    ));
                }
            }
            FieldValidator::MaxLength(max) => {
                if s.chars().count() > *max {
                    violations.push(FieldViolation::new(
                        &field.id,
                        &field.name,
                        format!("must be at most {} characters", max),
                    ));
                }
            }
            FieldValidator::Pattern(pattern) => match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(s) {
                        violations.push(FieldViolation::new(
                            &field.id,
                            &field.name,
                            format!("must match pattern {}", pattern),
                        ));
                    }
                }
                Err(e) => warn!(
                    "field {} has an uncompilable pattern {:?}: {}",
                    field.id, pattern, e
                ),
            },
            FieldValidator::Range(_, _) => {}
        }
    }
}

fn check_range_validators(field: &FieldDefinition, n: f64, violations: &mut Vec<FieldViolation>) {
    for validator in &field.validators {
        if let FieldValidator::Range(min, max) = validator {
            if n < *min || n > *max {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    format!("must be between {} and {}", min, max),
                ));
            }
        }
    }
}

fn check_multiselect(field: &FieldDefinition, value: &Value, violations: &mut Vec<FieldViolation>) {
    let Some(entries) = value.as_array() else {
        violations.push(FieldViolation::new(
            &field.id,
            &field.name,
            "must be a list of options",
        ));
        return;
    };
    for entry in entries {
        let Some(s) = entry.as_str() else {
            violations.push(FieldViolation::new(
                &field.id,
                &field.name,
                "options must be strings",
            ));
            return;
        };
        if !field.options.is_empty() && !field.options.iter().any(|o| o == s) {
            violations.push(FieldViolation::new(
                &field.id,
                &field.name,
                format!("{:?} is not an allowed option", s),
            ));
        }
    }
}

fn check_file(field: &FieldDefinition, value: &Value, violations: &mut Vec<FieldViolation>) {
    let Some(entries) = value.as_array() else {
        violations.push(FieldViolation::new(
            &field.id,
            &field.name,
            "must be a list of file references",
        ));
        return;
    };
    for entry in entries {
        let has_url = entry
            .as_object()
            .and_then(|o| o.get("url"))
            .map(|u| u.is_string())
            .unwrap_or(false);
        if !has_url {
            violations.push(FieldViolation::new(
                &field.id,
                &field.name,
                "file references must carry a url",
            ));
            return;
        }
    }
}

fn check_location(field: &FieldDefinition, value: &Value, violations: &mut Vec<FieldViolation>) {
    let Some(obj) = value.as_object() else {
        violations.push(FieldViolation::new(
            &field.id,
            &field.name,
            "must be a location object",
        ));
        return;
    };
    let lat_ok = obj.get("lat").map(|v| v.is_number()).unwrap_or(false);
    let lng_ok = obj.get("lng").map(|v| v.is_number()).unwrap_or(false);
    if !lat_ok || !lng_ok {
        violations.push(FieldViolation::new(
            &field.id,
            &field.name,
            "must carry numeric lat and lng",
        ));
    }
    if let Some(address) = obj.get("address") {
        if !address.is_string() {
            violations.push(FieldViolation::new(
                &field.id,
                &field.name,
                "address must be a string",
            ));
        }
    }
}

fn check_relationship(field: &FieldDefinition, value: &Value, violations: &mut Vec<FieldViolation>) {
    match value {
        Value::String(_) => {}
        Value::Array(ids) => {
            if !field.allow_multiple {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "accepts a single related id",
                ));
            } else if ids.iter().any(|v| !v.is_string()) {
                violations.push(FieldViolation::new(
                    &field.id,
                    &field.name,
                    "related ids must be strings",
                ));
            }
        }
        _ => violations.push(FieldViolation::new(
            &field.id,
            &field.name,
            "must be a related id or list of ids",
        )),
    }
}
