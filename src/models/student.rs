use serde::{Deserialize, Serialize};
use std::fmt;

/// A student on a class roster. `roll_number` is the identity key within a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub name: String,
    pub roll_number: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Roll number required.")]
    MissingRollNumber,
    #[error("Name required.")]
    MissingName,
    #[error("Roll number '{0}' is already on the roster")]
    DuplicateRollNumber(String),
}

impl Student {
    pub fn new(
        name: impl Into<String>,
        roll_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            roll_number: roll_number.into(),
            email: email.into(),
        }
    }

    /// Returns a copy with every field trimmed.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            roll_number: self.roll_number.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    /// Validation for the manual entry form: name and roll number are required.
    pub fn validate_entry(&self) -> Result<(), ValidationError> {
        if self.roll_number.trim().is_empty() {
            return Err(ValidationError::MissingRollNumber);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(())
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.roll_number)?;
        if !self.email.is_empty() {
            write!(f, " <{}>", self.email)?;
        }
        Ok(())
    }
}
