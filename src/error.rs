//! Error taxonomy for the scraping pipeline.
//!
//! Errors are grouped into four kinds that drive how loudly they are logged:
//!
//! | Kind | Raised when | Logged as |
//! |------|-------------|-----------|
//! | [`ErrorKind::Network`] | connect/timeout failures, non-2xx responses | scaled by status class |
//! | [`ErrorKind::Parsing`] | an expected page element is absent | error |
//! | [`ErrorKind::DateParse`] | a publication date cannot be read | debug only (silent rejection) |
//! | [`ErrorKind::Validation`] | a record misses a required field | error |

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("{url} unavailable after {attempts} attempts")]
    Unavailable { url: String, attempts: u32 },

    #[error("no {element} found at {url}")]
    Parsing { element: String, url: String },

    #[error("invalid article: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Coarse classification used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parsing,
    DateParse,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Parsing => "PARSING_ERROR",
            ErrorKind::DateParse => "DATE_PARSE_FAILURE",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScrapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::Status { .. } | ScrapeError::Unavailable { .. } | ScrapeError::Http(_) => {
                ErrorKind::Network
            }
            ScrapeError::Parsing { .. } => ErrorKind::Parsing,
            ScrapeError::Validation(_) => ErrorKind::Validation,
            ScrapeError::Config(_)
            | ScrapeError::Io(_)
            | ScrapeError::Url(_)
            | ScrapeError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Log severity. `tracing` has no critical level, so critical events are
/// emitted at `ERROR` with a `severity = "critical"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warn,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

/// Severity of a non-2xx response: 429 warns, 5xx is critical, anything
/// else is an error.
pub fn status_severity(status: StatusCode) -> Severity {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Severity::Warn
    } else if status.is_server_error() {
        Severity::Critical
    } else {
        Severity::Error
    }
}

/// Emit a tracing event at the level matching `severity`.
#[macro_export]
macro_rules! log_at_severity {
    ($severity:expr, $($arg:tt)+) => {
        match $severity {
            s @ $crate::error::Severity::Warn => tracing::warn!(severity = s.as_str(), $($arg)+),
            s @ $crate::error::Severity::Error => tracing::error!(severity = s.as_str(), $($arg)+),
            s @ $crate::error::Severity::Critical => tracing::error!(severity = s.as_str(), $($arg)+),
        }
    };
}
