//! Error types for Taskflow Core
//!
//! Provides error handling for:
//! - Missing or malformed input
//! - Authentication and authorization failures
//! - Absent referenced entities
//! - Conflicting writes (duplicates, stale versions)
//! - Persistence failures

/// Entity kinds, used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Project,
    Task,
    Issue,
    Notification,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Project => "Project",
            EntityKind::Task => "Task",
            EntityKind::Issue => "Issue",
            EntityKind::Notification => "Notification",
        };
        f.write_str(name)
    }
}

/// Persistence store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Record absent
    #[error("{kind} not found")]
    NotFound { kind: EntityKind, id: String },

    /// Unique constraint violated
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// Write based on an outdated version
    #[error("{kind} {id} was modified concurrently")]
    StaleWrite { kind: EntityKind, id: String },

    /// Backend cannot serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Classification of a [`WorkflowError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    Internal,
}

/// Main Taskflow error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// Missing or malformed required fields
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired credential
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but forbidden
    #[error("{0}")]
    Authorization(String),

    /// Referenced entity absent
    #[error("{kind} not found")]
    NotFound { kind: EntityKind },

    /// Duplicate entry or stale write
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Create validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create authorization error
    #[inline]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    /// Create not-found error
    #[inline]
    #[must_use]
    pub fn not_found(kind: EntityKind) -> Self {
        Self::NotFound { kind }
    }

    /// Classify the error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure is on the server side
    #[inline]
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, .. } => Self::NotFound { kind },
            StoreError::Duplicate { field, .. } => Self::Conflict(format!("{field} already exists")),
            e @ StoreError::StaleWrite { .. } => Self::Conflict(e.to_string()),
            StoreError::Unavailable(msg) => Self::Internal(msg),
        }
    }
}

/// Result alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
