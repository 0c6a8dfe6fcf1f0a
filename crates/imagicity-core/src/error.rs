//! # Error Types
//!
//! Domain-specific error types for imagicity-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  imagicity-core errors (this file)                                     │
//! │  ├── CoreError        - Invalid numeric input to the GST engine        │
//! │  └── ValidationError  - Form-level input validation failures           │
//! │                                                                         │
//! │  imagicity-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller (UI / API)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core fails loudly and immediately. It never clamps a negative amount
//! to zero and never logs; the caller decides what the user sees.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A numeric argument is outside the domain of the computation.
    ///
    /// ## When This Occurs
    /// - Negative taxable amount passed to the GST split
    ///   (e.g. a fixed per-unit discount larger than the unit price)
    /// - Negative tax rate
    /// - Line index outside the draft
    ///
    /// ## User Workflow
    /// ```text
    /// Edit line (discount: ₹500/unit, price: ₹400)
    ///      │
    ///      ▼
    /// recalc_line → split_gst(-100, 18%)
    ///      │
    ///      ▼
    /// InvalidArgument { field: "amount", reason: "cannot be negative" }
    ///      │
    ///      ▼
    /// UI shows: "amount cannot be negative"
    /// ```
    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidArgument error.
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: Decimal,
        max: Decimal,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid GSTIN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
