//! Error types for rakshita.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

use crate::models::AlertId;

/// Errors that can occur in rakshita operations.
#[derive(Error, Debug)]
pub enum RakshitaError {
    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An alert with this id is already in the store
    #[error("Alert {0} already exists")]
    DuplicateAlert(AlertId),

    /// Alert record failed its own invariants
    #[error("Invalid alert data: {0}")]
    InvalidAlert(String),

    /// Field cache key rejected
    #[error("Invalid form field name: {0}")]
    InvalidFieldKey(String),
}

/// Ordered list of form validation failures.
///
/// Displays as a single comma-joined banner message.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// Convert into a `Result`, failing if any message was collected.
    ///
    /// # Errors
    ///
    /// Returns `self` when it holds at least one message.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_join() {
        let mut errors = ValidationErrors::new();
        errors.push("Name must be at least 2 characters long");
        errors.push("Please enter a valid email address");

        assert_eq!(
            errors.to_string(),
            "Name must be at least 2 characters long, Please enter a valid email address"
        );
        assert!(errors.clone().into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_errors_into_anyhow() {
        let mut errors = ValidationErrors::new();
        errors.push("Subject must be at least 5 characters long");
        let err = anyhow::Error::from(errors);
        assert_eq!(err.to_string(), "Subject must be at least 5 characters long");
        assert!(ValidationErrors::new().to_string().is_empty());
    }
}
