use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Convenience alias used across the vidlens crates.
pub type Result<T> = std::result::Result<T, VidlensError>;

/// Top-level error type for video analysis.
#[derive(Debug, Error)]
pub enum VidlensError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid video reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("prompt template error: {0}")]
    TemplateFormat(#[from] TemplateError),

    /// Non-success status from the remote service. `message` is the
    /// service-provided text, untouched.
    #[error("remote service returned {status_code}: {message}")]
    RemoteService { status_code: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Extraction(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures while substituting values into a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("no value supplied for placeholder {{{0}}}")]
    MissingValue(String),

    #[error("empty placeholder {{}} at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("unmatched brace at byte {0}")]
    UnmatchedBrace(usize),
}

impl VidlensError {
    pub fn config(msg: impl fmt::Display) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Whether the error was raised before any network traffic happened.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::InvalidReference { .. } | Self::TemplateFormat(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = VidlensError::RemoteService {
            status_code: 500,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "remote service returned 500: overloaded");
        assert!(!err.is_local());
    }

    #[test]
    fn test_template_error_converts() {
        let err: VidlensError = TemplateError::MissingValue("name".into()).into();
        assert!(err.is_local());
        assert!(err.to_string().contains("{name}"));
    }
}
