//! Field validation shared by the CRUD route handlers.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field} must not be empty")]
pub struct EmptyFieldError {
    pub field: &'static str,
}

/// Reject empty or whitespace-only required fields.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), EmptyFieldError> {
    if value.trim().is_empty() {
        Err(EmptyFieldError { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(require_non_empty("name", "").is_err());
        assert!(require_non_empty("title", "   ").is_err());
    }

    #[test]
    fn accepts_non_empty() {
        assert!(require_non_empty("name", "Omio 5 CNC").is_ok());
    }

    #[test]
    fn error_names_the_field() {
        let err = require_non_empty("title", "").unwrap_err();
        assert_eq!(err.to_string(), "title must not be empty");
    }
}
