//! # Error Types
//!
//! The domain error taxonomy for the order engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Error Types                           │
//! │                                                             │
//! │  bazaar-core errors (this file)                             │
//! │  └── OrderError      - Business rule violations             │
//! │                                                             │
//! │  bazaar-db errors (separate crate)                          │
//! │  └── DbError         - Infrastructure failures              │
//! │                                                             │
//! │  Flow: DbError ──(logged, collapsed)──► OrderError::Internal│
//! │        OrderError ──► transport maps kind() to 4xx/5xx      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (IDs, quantities, allowed sets)
//! 3. Errors are enum variants, never strings
//! 4. Domain errors carry caller-correctable detail; `Internal` carries
//!    nothing: its detail lives only in server-side logs

use serde::Serialize;
use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Order Error
// =============================================================================

/// Business rule violations and domain failures.
///
/// Every variant except [`OrderError::Internal`] represents a caller or
/// business-logic mistake and is returned synchronously for the caller to
/// correct; none of them are retried automatically.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order absent from storage.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A requested product absent from the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Caller may not read or mutate this order.
    #[error("{0}")]
    Forbidden(String),

    /// Order creation requested with zero line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line quantity outside the accepted range.
    #[error("Quantity must be between 1 and {max}, got {requested}")]
    InvalidQuantity { requested: i64, max: i64 },

    /// More line items than a single order accepts.
    #[error("Order cannot have more than {max} items")]
    TooManyLines { max: usize },

    /// A buyer attempting to purchase their own listing.
    #[error("You cannot purchase your own product: \"{name}\"")]
    SelfPurchase { name: String },

    /// Requested quantity exceeds available stock.
    #[error("Insufficient stock for \"{name}\": available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Status change not in the transition table.
    #[error("Invalid status transition from \"{from}\" to \"{to}\". Allowed: {allowed:?}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        allowed: &'static [OrderStatus],
    },

    /// Cancellation requested on a non-pending order.
    #[error("Cannot cancel order with status \"{status}\". Only pending orders can be canceled")]
    NotCancelable { status: OrderStatus },

    /// Any unexpected/infrastructure failure. Deliberately opaque: the
    /// underlying cause is logged server-side, never surfaced to callers.
    #[error("Unexpected error occurred. Please check server logs")]
    Internal,
}

/// Convenience type alias for Results with OrderError.
pub type OrderResult<T> = Result<T, OrderError>;

// =============================================================================
// Error Kind (transport mapping)
// =============================================================================

/// Machine-readable error categories.
///
/// The transport layer (outside this workspace) maps each kind to one
/// stable status: NotFound → 404, Forbidden → 403, Internal → 500, and the
/// rest → 400. The mapping is deterministic given the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidArgument,
    InsufficientStock,
    InvalidTransition,
    InvalidState,
    Internal,
}

impl OrderError {
    /// Returns the stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::OrderNotFound(_) | OrderError::ProductNotFound(_) => ErrorKind::NotFound,
            OrderError::Forbidden(_) => ErrorKind::Forbidden,
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. }
            | OrderError::TooManyLines { .. }
            | OrderError::SelfPurchase { .. } => ErrorKind::InvalidArgument,
            OrderError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            OrderError::NotCancelable { .. } => ErrorKind::InvalidState,
            OrderError::Internal => ErrorKind::Internal,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
