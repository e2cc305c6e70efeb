//! Error types for billed-core
//!
//! Error codes, severities and detailed messages for the bill controllers,
//! plus the logger seam the controllers report failures through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Remote store call failed
    StoreError,
    /// No authenticated user
    NotAuthenticated,
    /// Session data could not be read
    MalformedSession,
    /// File rejected by the client-side check
    InvalidFile,
    /// Date could not be formatted
    InvalidDate,
    /// Serialization failure
    SerializationError,
    /// IO error
    IoError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::StoreError => write!(f, "STORE_ERROR"),
            ErrorCode::NotAuthenticated => write!(f, "NOT_AUTHENTICATED"),
            ErrorCode::MalformedSession => write!(f, "MALFORMED_SESSION"),
            ErrorCode::InvalidFile => write!(f, "INVALID_FILE"),
            ErrorCode::InvalidDate => write!(f, "INVALID_DATE"),
            ErrorCode::SerializationError => write!(f, "SERIALIZATION_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for billed-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Store failures keep the store's message verbatim ("Erreur 404")
    #[error("{message}")]
    Store { message: String },

    #[error("No authenticated user")]
    NotAuthenticated,

    #[error("Malformed session: {message}")]
    MalformedSession { message: String },

    #[error("Invalid file '{file_name}': extension not allowed")]
    InvalidFile { file_name: String },

    #[error("Invalid date: {value}")]
    InvalidDate { value: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl CoreError {
    /// Shorthand for a store failure
    pub fn store(message: impl Into<String>) -> Self {
        CoreError::Store {
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Store { .. } => ErrorCode::StoreError,
            CoreError::NotAuthenticated => ErrorCode::NotAuthenticated,
            CoreError::MalformedSession { .. } => ErrorCode::MalformedSession,
            CoreError::InvalidFile { .. } => ErrorCode::InvalidFile,
            CoreError::InvalidDate { .. } => ErrorCode::InvalidDate,
            CoreError::Serialization { .. } => ErrorCode::SerializationError,
            CoreError::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Store { .. } => ErrorSeverity::Error,
            CoreError::NotAuthenticated => ErrorSeverity::Warning,
            CoreError::MalformedSession { .. } => ErrorSeverity::Error,
            CoreError::InvalidFile { .. } => ErrorSeverity::Info,
            CoreError::InvalidDate { .. } => ErrorSeverity::Warning,
            CoreError::Serialization { .. } => ErrorSeverity::Error,
            CoreError::Io { .. } => ErrorSeverity::Error,
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(error: std::io::Error) -> Self {
        CoreError::Io {
            message: error.to_string(),
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// User email (if known)
    pub user: Option<String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            user: None,
        }
    }

    /// Add the user email
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Error logger trait
///
/// Controllers report swallowed failures here instead of rethrowing them.
pub trait ErrorLogger: Send + Sync {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let level = match error.severity() {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
        };
        log::log!(
            target: "billed::error",
            level,
            "[{}] {} - Operation: {} - User: {:?}",
            error.code(),
            error,
            context.operation,
            context.user
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "billed::error",
            "{} - Operation: {} - User: {:?}",
            message,
            context.operation,
            context.user
        );
    }
}

// ==================== Tests ====================
