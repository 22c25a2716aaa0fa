//! # bazaar-db: Storage Layer and Order Engine
//!
//! SQLite-backed persistence for the bazaar order engine, plus the
//! [`OrderEngine`] that drives all order operations transactionally.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    bazaar-db Layout                         │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                 OrderEngine (engine)                  │  │
//! │  │   create / find / update_status / cancel, each a      │  │
//! │  │   transaction; business rules from bazaar-core        │  │
//! │  └──────────────┬────────────────────────┬───────────────┘  │
//! │                 │                        │                  │
//! │  ┌──────────────▼──────────┐ ┌───────────▼───────────────┐  │
//! │  │ repository::product     │ │ repository::order         │  │
//! │  │ stock ledger + catalog  │ │ aggregate load/store      │  │
//! │  └──────────────┬──────────┘ └───────────┬───────────────┘  │
//! │                 │                        │                  │
//! │  ┌──────────────▼────────────────────────▼───────────────┐  │
//! │  │          pool (Database) + migrations (sqlx)          │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repository modules expose two shapes: free functions taking
//! `&mut SqliteConnection` for use inside a caller-owned transaction,
//! and pool-backed `*Repository` structs for standalone reads.

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use engine::OrderEngine;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
