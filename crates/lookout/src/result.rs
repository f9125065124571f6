//! Result and error types for Lookout.

use std::time::Duration;
use thiserror::Error;

/// Result type for Lookout operations
pub type LookoutResult<T> = Result<T, LookoutError>;

/// Errors that can occur in Lookout
#[derive(Debug, Error)]
pub enum LookoutError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Crate was built without the `browser` feature
    #[error("Browser control unavailable: rebuild with the `browser` feature")]
    BrowserUnavailable,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error (page gone, closed, or crashed)
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// In-page expression evaluation failed
    #[error("Evaluation of `{expression}` failed: {message}")]
    EvaluationError {
        /// Expression that was evaluated
        expression: String,
        /// Error message
        message: String,
    },

    /// Condition did not hold within its time budget
    #[error("Timed out after {}ms waiting for {waited_for}", .elapsed.as_millis())]
    Timeout {
        /// Time spent waiting
        elapsed: Duration,
        /// Description of what was waited for
        waited_for: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Key name not present in the key table
    #[error("Unknown key: {name}")]
    UnknownKey {
        /// Key name as given
        name: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Probe path or expression is malformed
    #[error("Invalid probe `{path}`: {message}")]
    InvalidProbe {
        /// Offending path
        path: String,
        /// Error message
        message: String,
    },

    /// Scenario file failed to parse or validate
    #[error("Invalid scenario: {message}")]
    InvalidScenario {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LookoutError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EvaluationError {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create a scenario validation error
    #[must_use]
    pub fn invalid_scenario(message: impl Into<String>) -> Self {
        Self::InvalidScenario {
            message: message.into(),
        }
    }

    /// Whether this error is a timeout rather than a hard failure
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_reports_millis() {
        let err = LookoutError::Timeout {
            elapsed: Duration::from_millis(300),
            waited_for: "player on ground".into(),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 300ms waiting for player on ground"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_evaluation_error() {
        let err = LookoutError::evaluation("window.game", "context destroyed");
        assert!(err.to_string().contains("window.game"));
        assert!(err.to_string().contains("context destroyed"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LookoutError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
