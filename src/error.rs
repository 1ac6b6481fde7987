use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Roll,
    Department,
    Email,
    Phone,
    Username,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Roll => "roll",
            Field::Department => "department",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Username => "username",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{0} cannot be empty")]
    EmptyField(Field),
    #[error("invalid {field} format: {reason}")]
    InvalidFormat { field: Field, reason: &'static str },
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::EmptyField(f) => *f,
            FieldError::InvalidFormat { field, .. } => *field,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FieldError::EmptyField(_) => "empty_field",
            FieldError::InvalidFormat { .. } => "invalid_format",
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "field": self.field(),
            "code": self.code(),
            "message": self.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{}", describe_fields(.0))]
    Invalid(Vec<FieldError>),
    #[error("student with roll number '{0}' already exists")]
    DuplicateRoll(String),
    #[error("student with email '{0}' already exists")]
    DuplicateEmail(String),
    #[error("user '{0}' already exists")]
    DuplicateUsername(String),
    #[error("student {0} not found")]
    NotFound(i64),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<FieldError> for StoreError {
    fn from(e: FieldError) -> Self {
        StoreError::Invalid(vec![e])
    }
}

impl StoreError {
    /// Wire code for the IPC error object. A multi-field validation failure
    /// reports the code of its first field.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Invalid(fields) => fields
                .first()
                .map(FieldError::code)
                .unwrap_or("invalid_format"),
            StoreError::DuplicateRoll(_) => "duplicate_roll",
            StoreError::DuplicateEmail(_) => "duplicate_email",
            StoreError::DuplicateUsername(_) => "duplicate_username",
            StoreError::NotFound(_) => "not_found",
            StoreError::StoreUnavailable(_) | StoreError::PasswordHash(_) => "store_unavailable",
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            StoreError::Invalid(fields) => Some(json!({
                "fields": fields.iter().map(FieldError::to_json).collect::<Vec<_>>()
            })),
            StoreError::DuplicateRoll(v) => Some(json!({ "field": "roll", "value": v })),
            StoreError::DuplicateEmail(v) => Some(json!({ "field": "email", "value": v })),
            StoreError::DuplicateUsername(v) => Some(json!({ "field": "username", "value": v })),
            StoreError::NotFound(id) => Some(json!({ "id": id })),
            _ => None,
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
