//! Error types for sitemap-gen
//!
//! This module defines all error types used throughout the library.
//! Per-field constraint violations are not represented here: they are
//! silent no-ops that leave the field unset. Only an unresolved required
//! field becomes a [`ValidationError`] and aborts the run.

use std::fmt;
use thiserror::Error;

/// Result type alias using sitemap-gen Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sitemap generation
#[derive(Error, Debug)]
pub enum Error {
    /// Generator configuration error (domain/public directory/data source
    /// unset before generation)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Item validation error (required field unresolved)
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(e) => Error::Io(std::sync::Arc::try_unwrap(e)
                .unwrap_or_else(|arc| std::io::Error::new(arc.kind(), arc.to_string()))),
            other => Error::Xml(other.to_string()),
        }
    }
}

/// Validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Field that failed validation
    pub field: Option<String>,
    /// Original failure reason
    pub reason: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            reason: None,
        }
    }

    /// Create the error for a required field that never resolved
    pub fn missing_required(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("required field '{}' has no value", field),
            field: Some(field),
            reason: None,
        }
    }

    /// Set the field that failed
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref field) = self.field {
            write!(f, " (field: {})", field)?;
        }

        if let Some(ref reason) = self.reason {
            write!(f, "\n\nReason: {}", reason)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}
