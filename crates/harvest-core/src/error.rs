//! # Error Types
//!
//! Domain-specific error types for harvest-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  harvest-core errors (this file)                                       │
//! │  ├── CoreError         - Operation failures returned by the Tracker    │
//! │  ├── ValidationErrors  - A batch of field errors (never fail-fast)     │
//! │  └── ValidationError   - One field-level failure                       │
//! │                                                                         │
//! │  store errors (store.rs)                                               │
//! │  └── StorageError      - KeyValueStore failures, wrapped as            │
//! │                          CoreError::Persistence                        │
//! │                                                                         │
//! │  harvest-db errors (separate crate)                                    │
//! │  └── DbError           - SQLite failures                               │
//! │                                                                         │
//! │  App errors (apps/harvest-tracker)                                     │
//! │  └── ApiError          - What the command channel sees (serialized)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Check Order
//! Every operation runs its checks in the same order and stops at the first
//! stage that fails:
//! 1. field checks, accumulated into one [`ValidationErrors`] batch
//! 2. key and reference checks (`DuplicateKey`, `NotFound`)
//! 3. stock checks (`InsufficientStock`)
//!
//! No ledger is touched until all three stages pass.

use std::fmt;

use thiserror::Error;

use crate::store::StorageError;

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by tracker operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more fields failed validation.
    ///
    /// The batch carries every failing field, so a form can highlight all of
    /// them at once.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A referenced record does not exist.
    ///
    /// ## When This Occurs
    /// - Purchase references an unknown farmer
    /// - Order references a category missing from the catalog
    /// - Update/delete of an id that is not stored
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A record with the same id already exists.
    #[error("{entity} '{id}' already exists")]
    DuplicateKey { entity: String, id: String },

    /// Debit would take a ledger below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Place order (Large (500g) × 5)
    ///      │
    ///      ▼
    /// Packaged ledger: 3 units
    ///      │
    ///      ▼
    /// InsufficientStock { category: "Large (500g)", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {category}: available {available}, requested {requested}")]
    InsufficientStock {
        category: String,
        available: f64,
        requested: f64,
    },

    /// CSV export of the report was requested before any report was built.
    #[error("No report generated yet")]
    ReportNotGenerated,

    /// The CSV writer rejected a record.
    #[error("CSV export failed: {0}")]
    Export(String),

    /// The in-memory mutation succeeded but mirroring it to the store failed.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a DuplicateKey error.
    pub fn duplicate(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::DuplicateKey {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the validation batch, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            CoreError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(ValidationErrors::from(vec![err]))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value does not match the expected pattern.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A numeric field was missing or not a finite number.
    #[error("{field} must be a number")]
    NotANumber { field: String },

    /// Value must be strictly greater than zero.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// A date lies after today.
    #[error("{field} cannot be in the future")]
    InFuture { field: String },

    /// A date lies before today.
    #[error("{field} cannot be in the past")]
    InPast { field: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A category key does not name a known ledger entry.
    #[error("{field} '{category}' does not exist")]
    UnknownCategory { field: String, category: String },

    /// Packaging quantity is smaller than one unit of the target category.
    #[error("Quantity {quantity} kg is too low to form a single unit of {category}")]
    BelowOneUnit { category: String, quantity: f64 },
}

// =============================================================================
// Validation Batch
// =============================================================================

/// An ordered batch of [`ValidationError`]s.
///
/// Validators push into the batch instead of returning early; the caller then
/// converts the batch with [`ValidationErrors::into_result`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Creates an empty batch.
    pub fn new() -> Self {
        ValidationErrors(Vec::new())
    }

    /// Adds one failure to the batch.
    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    /// Records the error half of a single-field check.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.0.push(err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Human-readable messages, one per failure.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }

    /// `Ok(())` for an empty batch, otherwise `CoreError::Validation`.
    pub fn into_result(self) -> CoreResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        ValidationErrors(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
