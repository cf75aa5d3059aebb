//! Form field types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registration form field, named by its wire key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldName {
    #[serde(rename = "facultyName")]
    FacultyName,
    #[serde(rename = "fullName")]
    FullName,
    #[serde(rename = "rollNo")]
    RollNo,
    #[serde(rename = "password")]
    Password,
    #[serde(rename = "class")]
    Class,
    #[serde(rename = "section")]
    Section,
}

impl FieldName {
    /// Validation order
    pub const ALL: [FieldName; 6] = [
        FieldName::FacultyName,
        FieldName::FullName,
        FieldName::RollNo,
        FieldName::Password,
        FieldName::Class,
        FieldName::Section,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::FacultyName => "facultyName",
            FieldName::FullName => "fullName",
            FieldName::RollNo => "rollNo",
            FieldName::Password => "password",
            FieldName::Class => "class",
            FieldName::Section => "section",
        }
    }

    /// Human label as shown on the form
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::FacultyName => "Faculty Name",
            FieldName::FullName => "Student Full Name",
            FieldName::RollNo => "Roll No",
            FieldName::Password => "Password",
            FieldName::Class => "Class",
            FieldName::Section => "Section",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

/// Operator-entered registration details
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFields {
    pub faculty_name: String,
    pub full_name: String,
    pub roll_no: String,
    pub password: String,
    pub class: String,
    pub section: String,
}

impl RegistrationFields {
    pub fn get(&self, name: FieldName) -> &str {
        match name {
            FieldName::FacultyName => &self.faculty_name,
            FieldName::FullName => &self.full_name,
            FieldName::RollNo => &self.roll_no,
            FieldName::Password => &self.password,
            FieldName::Class => &self.class,
            FieldName::Section => &self.section,
        }
    }

    fn slot(&mut self, name: FieldName) -> &mut String {
        match name {
            FieldName::FacultyName => &mut self.faculty_name,
            FieldName::FullName => &mut self.full_name,
            FieldName::RollNo => &mut self.roll_no,
            FieldName::Password => &mut self.password,
            FieldName::Class => &mut self.class,
            FieldName::Section => &mut self.section,
        }
    }

    pub(crate) fn set(&mut self, name: FieldName, value: String) {
        *self.slot(name) = value;
    }

    /// First field that is empty after trimming
    pub fn first_missing(&self) -> Option<FieldName> {
        FieldName::ALL
            .into_iter()
            .find(|name| self.get(*name).trim().is_empty())
    }

    /// Phase-1 check: all six fields must be non-empty
    pub fn validate_for_phase1(&self) -> Result<(), ValidationError> {
        match self.first_missing() {
            Some(name) => Err(ValidationError::MissingField(name)),
            None => Ok(()),
        }
    }
}

// Password stays out of logs
impl fmt::Debug for RegistrationFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationFields")
            .field("faculty_name", &self.faculty_name)
            .field("full_name", &self.full_name)
            .field("roll_no", &self.roll_no)
            .field("password", &"<redacted>")
            .field("class", &self.class)
            .field("section", &self.section)
            .finish()
    }
}

/// Fields as exposed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsView {
    pub faculty_name: String,
    pub full_name: String,
    pub roll_no: String,
    pub password_set: bool,
    pub class: String,
    pub section: String,
}

impl From<&RegistrationFields> for FieldsView {
    fn from(fields: &RegistrationFields) -> Self {
        Self {
            faculty_name: fields.faculty_name.clone(),
            full_name: fields.full_name.clone(),
            roll_no: fields.roll_no.clone(),
            password_set: !fields.password.is_empty(),
            class: fields.class.clone(),
            section: fields.section.clone(),
        }
    }
}

/// Operator input problems that block a transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(FieldName),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("OTP is required")]
    MissingOtp,
}
