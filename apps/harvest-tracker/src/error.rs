//! # API Error Type
//!
//! Unified error type for tracker commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Harvest Ledger                         │
//! │                                                                         │
//! │  stdin: {"id":7,"command":"place_order","args":{...}}                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function → Result<T, ApiError>                          │  │
//! │  │                                                                  │  │
//! │  │  Bad args?         ─── serde_json::Error ───────┐               │  │
//! │  │  Validation batch? ─── CoreError::Validation ───┤               │  │
//! │  │  Short stock?      ─── CoreError::Insufficient ─┼──► ApiError   │  │
//! │  │  Store behind?     ─── CoreError::Persistence ──┤               │  │
//! │  │  SQLite down?      ─── DbError ─────────────────┘               │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stdout: {"id":7,"ok":false,"error":{"code":"VALIDATION_ERROR",        │
//! │           "message":"Validation failed","details":["Quantity ..."]}}    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use harvest_core::{CoreError, StorageError};
use harvest_db::DbError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// API error written back for a failed command.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Farmer not found: F9"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Every field failure of a validation batch, in check order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced record does not exist
    NotFound,

    /// One or more fields failed validation
    ValidationError,

    /// Record id already taken
    DuplicateKey,

    /// Debit would go below zero
    InsufficientStock,

    /// Mutation applied but the store is behind
    StorageError,

    /// SQLite failure outside a tracker operation
    DatabaseError,

    /// Unknown command, malformed request or arguments
    BadRequest,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts ledger errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => ApiError {
                code: ErrorCode::ValidationError,
                message: "Validation failed".to_string(),
                details: errors.messages(),
            },
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            CoreError::DuplicateKey { entity, id } => ApiError::new(
                ErrorCode::DuplicateKey,
                format!("{} '{}' already exists", entity, id),
            ),
            err @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::ReportNotGenerated => {
                ApiError::bad_request("Generate a report before exporting it")
            }
            CoreError::Export(e) => {
                tracing::error!("CSV export failed: {}", e);
                ApiError::internal("CSV export failed")
            }
            CoreError::Persistence(e) => e.into(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::warn!(error = %err, "Store is behind the ledgers");
        ApiError::new(ErrorCode::StorageError, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            other => {
                // log the detail, return a generic message
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid arguments: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Failures while loading or saving `tracker.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoPath,

    #[error("Could not create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{ValidationError, ValidationErrors};

    #[test]
    fn test_validation_batch_becomes_details() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::Required {
            field: "Name".to_string(),
        });
        errors.push(ValidationError::MustBePositive {
            field: "Quantity".to_string(),
        });

        let api: ApiError = CoreError::Validation(errors).into();
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert_eq!(api.details.len(), 2);
        assert_eq!(api.details[0], "Name is required");
    }

    #[test]
    fn test_stock_error_keeps_numbers() {
        let api: ApiError = CoreError::InsufficientStock {
            category: "North".to_string(),
            available: 3.0,
            requested: 5.0,
        }
        .into();
        assert_eq!(api.code, ErrorCode::InsufficientStock);
        assert!(api.message.contains("available 3"));
    }

    #[test]
    fn test_serialized_codes_are_screaming_snake() {
        let json = serde_json::to_value(ApiError::not_found("Order", "O1")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_persistence_maps_to_storage_error() {
        let api: ApiError =
            CoreError::Persistence(StorageError::Backend("disk full".to_string())).into();
        assert_eq!(api.code, ErrorCode::StorageError);
    }
}
