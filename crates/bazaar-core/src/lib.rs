//! # bazaar-core: Pure Business Logic for the Bazaar Order Engine
//!
//! This crate is the **heart** of the order fulfillment engine. It contains
//! all business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Bazaar Architecture                      │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │        Transport layer (REST/GraphQL, excluded)       │  │
//! │  └───────────────────────────┬───────────────────────────┘  │
//! │                              │ Caller {id, role}            │
//! │  ┌───────────────────────────▼───────────────────────────┐  │
//! │  │          bazaar-db (OrderEngine, repositories)        │  │
//! │  └───────────────────────────┬───────────────────────────┘  │
//! │                              │                              │
//! │  ┌───────────────────────────▼───────────────────────────┐  │
//! │  │             ★ bazaar-core (THIS CRATE) ★              │  │
//! │  │                                                       │  │
//! │  │  ┌─────────┐ ┌───────┐ ┌────────┐ ┌────────┐          │  │
//! │  │  │  types  │ │ money │ │ status │ │ access │          │  │
//! │  │  │  Order  │ │ Money │ │ table  │ │ rules  │          │  │
//! │  │  └─────────┘ └───────┘ └────────┘ └────────┘          │  │
//! │  │                                                       │  │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS   │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, OrderItem, Product, Caller, pagination)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`status`] - Order status state machine
//! - [`access`] - Access control predicates (buyer / seller / admin)
//! - [`validation`] - Order input validation
//! - [`error`] - Domain error taxonomy
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

pub mod access;
pub mod error;
pub mod money;
pub mod status;
pub mod types;
pub mod validation;

pub use error::{ErrorKind, OrderError, OrderResult};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single order.
///
/// ## Business Reason
/// Prevents runaway orders and keeps creation transactions short.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
