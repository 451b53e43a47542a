//! Error types for tenant-scoped query operations.
//!
//! Errors carry a stable code for programmatic handling:
//!
//! - 1xxx: Query errors (not found, not unique)
//! - 2xxx: Constraint violations
//! - 3xxx: Connection errors
//! - 5xxx: Execution errors
//! - 6xxx: Data errors
//! - 7xxx: Configuration errors
//! - 9xxx: Tenant and internal errors
//!
//! ```rust
//! use condoguard_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::not_found("User");
//! assert_eq!(err.code, ErrorCode::RecordNotFound);
//! assert!(err.is_not_found());
//!
//! // Tenant resolution failures are reported as plain not-found.
//! let err = QueryError::tenant_not_found();
//! assert!(err.is_not_found());
//! assert_eq!(err.public_message(), "Not Found");
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Record not found (P1001).
    RecordNotFound = 1001,
    /// Multiple records found when expecting one (P1002).
    NotUnique = 1002,
    /// Invalid filter or where clause (P1003).
    InvalidFilter = 1003,

    /// Unique constraint violation (P2001).
    UniqueConstraint = 2001,

    /// Database connection failed (P3001).
    ConnectionFailed = 3001,

    /// General database error (P5005).
    DatabaseError = 5005,

    /// Serialization error (P6002).
    SerializationError = 6002,
    /// Deserialization error (P6003).
    DeserializationError = 6003,

    /// Invalid configuration (P7001).
    InvalidConfiguration = 7001,

    /// No tenant matches the request (P9001).
    TenantNotFound = 9001,
    /// Internal error (P9002).
    Internal = 9002,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1001").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Record not found",
            Self::NotUnique => "Multiple records found",
            Self::InvalidFilter => "Invalid filter condition",
            Self::UniqueConstraint => "Unique constraint violation",
            Self::ConnectionFailed => "Database connection failed",
            Self::DatabaseError => "Database error",
            Self::SerializationError => "Serialization error",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::TenantNotFound => "Tenant not found",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The SQL query (if available).
    pub sql: Option<String>,
}

/// Errors that can occur during query and tenant resolution operations.
#[derive(Error, Debug)]
#[error("[{code}] {message}")]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message. Internal only, never shown to callers as-is.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL query.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a not found error.
    ///
    /// Records hidden by the active tenant produce exactly this error too.
    pub fn not_found(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(ErrorCode::RecordNotFound, format!("{} not found", model)).with_model(model)
    }

    /// Create a not unique error.
    pub fn not_unique(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::NotUnique,
            format!("Expected exactly one {} but found several", model),
        )
        .with_model(model)
    }

    /// Create an error for a request that needs a tenant and has none.
    ///
    /// The message never names the attempted subdomain.
    pub fn tenant_not_found() -> Self {
        Self::new(ErrorCode::TenantNotFound, "Tenant not found")
    }

    /// Create a unique constraint violation error.
    pub fn unique_violation(model: impl Into<String>, field: impl Into<String>) -> Self {
        let model = model.into();
        let field = field.into();
        Self::new(
            ErrorCode::UniqueConstraint,
            format!("Unique constraint violated on {}.{}", model, field),
        )
        .with_model(model)
        .with_field(field)
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFilter, message)
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConnectionFailed, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeserializationError, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    // ============== Error Classification ==============

    /// Check if this is a not found error, for a record or for a tenant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RecordNotFound | ErrorCode::TenantNotFound
        )
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self.code, ErrorCode::ConnectionFailed)
    }

    /// Check if this error is retryable.
    ///
    /// Not-found outcomes never are: retrying without new input cannot
    /// change the result.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, ErrorCode::ConnectionFailed)
    }

    /// Get the error code.
    pub fn error_code(&self) -> &ErrorCode {
        &self.code
    }

    /// Text safe to show to the caller.
    ///
    /// Both not-found kinds collapse to the same string so that a missing
    /// tenant, a missing record and a record owned by another tenant are
    /// indistinguishable.
    pub fn public_message(&self) -> &'static str {
        if self.is_not_found() {
            "Not Found"
        } else {
            "Internal Server Error"
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        if err.is_data() || err.is_syntax() || err.is_eof() {
            QueryError::deserialization(message).with_source(err)
        } else {
            QueryError::serialization(message).with_source(err)
        }
    }
}
