use serde::{Deserialize, Serialize};

/// A persisted student row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub roll: String,
    pub department: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw, caller-supplied field values (UI form or CSV row).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl StudentInput {
    pub fn new(name: &str, roll: &str, department: &str, email: &str, phone: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            roll: roll.to_string(),
            department: department.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
        }
    }
}

/// Normalized fields that passed validation. Only `validate::validate_student`
/// builds one, so the store can rely on the field invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub(crate) name: String,
    pub(crate) roll: String,
    pub(crate) department: String,
    pub(crate) email: String,
    pub(crate) phone: Option<String>,
}

impl StudentDraft {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roll(&self) -> &str {
        &self.roll
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}
