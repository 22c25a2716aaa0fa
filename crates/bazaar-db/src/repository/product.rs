//! # Product Repository
//!
//! Database operations for catalog products, including the stock ledger
//! the order engine mutates inside its transactions.
//!
//! ## Stock Ledger Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Stock Mutation Strategy                    │
//! │                                                             │
//! │  Deduction (order creation):                                │
//! │    UPDATE products SET stock = stock - ?                    │
//! │    WHERE id = ? AND stock >= ?                              │
//! │                                                             │
//! │    The `stock >= ?` guard is the row-level check-then-      │
//! │    deduct atomicity: if a concurrent transaction consumed   │
//! │    the stock first, zero rows match and the engine reports  │
//! │    InsufficientStock instead of driving stock negative.     │
//! │                                                             │
//! │  Restoration (cancellation):                                │
//! │    UPDATE products SET stock = stock + ?                    │
//! │    No guard needed - restoring only increases stock.        │
//! │                                                             │
//! │  Both run ONLY inside a transaction that also mutates the   │
//! │  dependent order rows, never standalone.                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::Product;

// =============================================================================
// Transaction-Scoped Operations (stock ledger)
// =============================================================================

/// Loads a product inside the caller's active transaction.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, description, price_cents, stock, seller_id,
               created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Decrements a product's stock by `quantity`, guarded against going
/// negative.
///
/// Returns the number of rows affected: `1` on success, `0` when the
/// guard rejected the deduction (stock consumed by a concurrent
/// transaction since the caller's read). The caller decides how to
/// surface a rejected deduction; this function never fabricates one.
pub async fn deduct_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<u64> {
    debug!(id = %id, quantity = %quantity, "Deducting stock");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2,
            updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Restores a product's stock by `quantity` (the exact inverse of
/// [`deduct_stock`], used by cancellation).
///
/// Restoring only increases stock so it cannot fail for availability
/// reasons; a missing product row (deleted after the order was created)
/// is reported as `NotFound` and the caller's transaction rolls back.
pub async fn restore_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<()> {
    debug!(id = %id, quantity = %quantity, "Restoring stock");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

// =============================================================================
// Pool-Backed Repository
// =============================================================================

/// Repository for catalog maintenance and reads outside a transaction.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Inserts a new product listing.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, stock, seller_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.seller_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's current price.
    ///
    /// Existing order items are unaffected: they carry their own frozen
    /// price snapshot from purchase time.
    pub async fn set_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        debug!(id = %id, price_cents = %price_cents, "Updating product price");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET price_cents = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(price_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts catalog products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
