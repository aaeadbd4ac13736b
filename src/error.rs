use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field-level validation failure. Validation collects every
/// violation in one pass so callers can fix a record in one correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field_id: String,
    pub field_name: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field_id: &str, field_name: &str, message: impl Into<String>) -> Self {
        Self {
            field_id: field_id.to_string(),
            field_name: field_name.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_name, self.message)
    }
}

#[derive(Debug)]
pub enum AppError {
    Database(anyhow::Error),
    DatabaseError(String),
    NotFound(String),
    Validation(Vec<FieldViolation>),
    ConstraintViolation(String),
    Conflict(String),
    StoreUnavailable(String),
    SerializationError(String),
    ConfigurationError(String),
}

impl AppError {
    /// Field ids named by a validation error, in violation order.
    pub fn violated_fields(&self) -> Vec<&str> {
        match self {
            AppError::Validation(violations) => {
                violations.iter().map(|v| v.field_id.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Validation(violations) => {
                let joined = violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Validation error: {}", joined)
            }
            AppError::ConstraintViolation(msg) => write!(f, "Constraint violation: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
