use thiserror::Error;

/// Storage-specific error types for the Keygate access-control backend.
///
/// These errors represent failures in database operations, registration
/// validation and data integrity checks.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Uniqueness constraint violated on registration
    #[error("Duplicate {entity_type}: {field} '{value}' is already in use")]
    Duplicate {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub(crate) fn not_found(entity_type: &str, field: &str, value: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn duplicate(entity_type: &str, field: &str, value: impl ToString) -> Self {
        Self::Duplicate {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Returns `true` for SQLite `UNIQUE` constraint failures.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(db)) if db.is_unique_violation())
    }
}

impl From<keygate_core::Error> for StorageError {
    fn from(err: keygate_core::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures of the verify-and-record flow.
///
/// A denied access is never an error: it is a successful `Verdict`. Every
/// variant here means no verdict is returned to the caller.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Malformed or missing PIN (or other request field). Never audited.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No active device matches the request origin or id. Never audited.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The store failed; the decision was not durably recorded.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

impl From<keygate_core::Error> for AccessError {
    fn from(err: keygate_core::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<sqlx::Error> for AccessError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(StorageError::Database(err))
    }
}

/// Result type for the verify-and-record flow
pub type AccessResult<T> = Result<T, AccessError>;
