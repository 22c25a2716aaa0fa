//! # Repository Modules
//!
//! Each repository owns the SQL for one aggregate:
//!
//! - [`product`] - catalog rows and the stock ledger
//! - [`order`] - orders and their line items
//!
//! Pool-backed methods serve single-statement reads and maintenance;
//! functions taking `&mut SqliteConnection` participate in a caller's
//! transaction and are how the order engine composes atomic operations.

pub mod order;
pub mod product;
