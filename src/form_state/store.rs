//! FormStateStore - mutable registration fields

use super::types::*;

/// Holds the operator's in-progress registration details.
///
/// Updates arrive one field at a time; validation is deferred until the
/// engine runs `RegistrationFields::validate_for_phase1` on a snapshot at
/// phase-1 submission.
#[derive(Debug, Default)]
pub struct FormStateStore {
    fields: RegistrationFields,
}

impl FormStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a single field update
    pub fn set_field(&mut self, name: FieldName, value: impl Into<String>) {
        self.fields.set(name, value.into());
        tracing::trace!(field = %name, "Form: Field updated");
    }

    /// Merge a field update addressed by its wire key
    pub fn set_field_by_key(&mut self, key: &str, value: impl Into<String>) -> Result<(), ValidationError> {
        let name: FieldName = key.parse()?;
        self.set_field(name, value);
        Ok(())
    }

    /// Clear per-student fields, keep the ones stable across a sitting
    pub fn reset_for_next_student(&mut self) {
        self.fields.full_name.clear();
        self.fields.roll_no.clear();
        self.fields.password.clear();
        tracing::debug!(
            faculty_name = %self.fields.faculty_name,
            class = %self.fields.class,
            section = %self.fields.section,
            "Form: Reset for next student"
        );
    }

    pub fn fields(&self) -> &RegistrationFields {
        &self.fields
    }

    pub fn snapshot(&self) -> RegistrationFields {
        self.fields.clone()
    }
}
