// src/error.rs

//! Unified error handling for the feed service.

use std::fmt;

use thiserror::Error;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Listing page answered with a non-success status
    #[error("Fetch of {url} failed with status {status}")]
    Fetch { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Mail settings are incomplete
    #[error("Mail configuration incomplete, missing: {}", .missing.join(", "))]
    MailConfig { missing: Vec<&'static str> },

    /// Building or sending the notification mail failed
    #[error("Mail error: {0}")]
    Mail(String),

    /// Event store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Feed rendering failed
    #[error("Feed error: {0}")]
    Feed(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a mail transport error.
    pub fn mail(message: impl fmt::Display) -> Self {
        Self::Mail(message.to_string())
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Whether this error came from fetching the listing page.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Http(_))
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        Self::mail(e)
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(e: lettre::error::Error) -> Self {
        Self::mail(e)
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(e: lettre::address::AddressError) -> Self {
        Self::mail(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_config_lists_missing_fields() {
        let err = AppError::MailConfig {
            missing: vec!["SMTP_HOST", "SMTP_PASSWORD"],
        };
        assert_eq!(
            err.to_string(),
            "Mail configuration incomplete, missing: SMTP_HOST, SMTP_PASSWORD"
        );
    }

    #[test]
    fn test_is_fetch() {
        let err = AppError::Fetch {
            url: "https://example.com".into(),
            status: 500,
        };
        assert!(err.is_fetch());
        assert!(!AppError::validation("x").is_fetch());
    }
}
