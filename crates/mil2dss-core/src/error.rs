//! Unified error type for the mil2dss pipeline.
//!
//! A single shared category lets callers isolate this subsystem's failures
//! from unrelated ones. Configuration and structural problems are fatal and
//! surfaced through these variants; recoverable parse/integrity issues are
//! recorded as [`crate::diagnostics`] entries instead.

use thiserror::Error;

/// Unified error type for all mil2dss operations.
#[derive(Error, Debug)]
pub enum MilError {
    /// I/O errors (file access, directory enumeration)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Project directory missing or containing no recognized tables
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required logical table is absent when a factory needs it
    #[error("Structural error: {0}")]
    Structure(String),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using MilError.
pub type MilResult<T> = Result<T, MilError>;

impl From<anyhow::Error> for MilError {
    fn from(err: anyhow::Error) -> Self {
        MilError::Other(err.to_string())
    }
}

impl From<String> for MilError {
    fn from(s: String) -> Self {
        MilError::Other(s)
    }
}

impl From<&str> for MilError {
    fn from(s: &str) -> Self {
        MilError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MilError::Structure("Circuit Elements table missing".into());
        assert!(err.to_string().contains("Structural error"));
        assert!(err.to_string().contains("Circuit Elements"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory");
        let err: MilError = io_err.into();
        assert!(matches!(err, MilError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> MilResult<()> {
            Err(MilError::Config("empty project".into()))
        }

        fn outer() -> MilResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
