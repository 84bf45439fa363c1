//! # Error Types
//!
//! Domain-specific error types for ths-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ths-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations (stock, shift, ...)   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ths-client errors (separate crate)                                    │
//! │  └── ClientError      - Transport, cache, config + wrapped CoreError   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Notification        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is detected locally and never reaches the transport layer.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations detected before any
/// remote call. The stores turn them into error notifications.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock to add the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan barcode (stock: 3, already in cart: 3)
    ///      │
    ///      ▼
    /// InsufficientStock { barcode, available: 3, requested: 4 }
    ///      │
    ///      ▼
    /// UI shows: "Not enough stock"
    /// ```
    #[error("Insufficient stock for {barcode}: available {available}, requested {requested}")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    ItemNotInCart(String),

    /// Checkout attempted with nothing in the cart.
    #[error("The cart is empty")]
    EmptyCart,

    /// An order was attempted while no shift is open.
    #[error("No shift has been started")]
    NoOpenShift,

    /// A new shift was requested while one is already open.
    #[error("Shift {0} is already open")]
    ShiftAlreadyOpen(i64),

    /// Transfer registration without origin or destination.
    #[error("Transfer origin and destination are required")]
    MissingTransferEndpoints,

    /// Origin and destination point at the same warehouse.
    #[error("Transfer origin and destination must differ (warehouse {0})")]
    SameTransferEndpoints(i64),

    /// No product matches the scanned barcode.
    #[error("No product with barcode {0}")]
    ProductNotFound(String),

    /// The scanned product lives in another warehouse.
    #[error("Product {barcode} is not stocked in the selected origin")]
    ProductNotInOrigin { barcode: String },

    /// The product exists but has nothing left to move or sell.
    #[error("Product {0} is out of stock")]
    OutOfStock(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
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
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
