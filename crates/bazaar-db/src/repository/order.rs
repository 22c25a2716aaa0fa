//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Aggregate Loading
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              How an Order Aggregate is Loaded               │
//! │                                                             │
//! │  1. SELECT the order row                                    │
//! │  2. SELECT its items JOINed with their products             │
//! │                                                             │
//! │  Every load resolves items AND products, because access     │
//! │  control needs each item's seller. There is no lazy path:   │
//! │  an Order in memory is always the full aggregate.           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inserts and status flips that must be atomic with stock mutations are
//! exposed as transaction-scoped functions; the pool-backed
//! [`OrderRepository`] serves the read side.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Order, OrderItem, OrderStatus, Page, Product};

// =============================================================================
// Row Shapes
// =============================================================================

/// The `orders` table row, without items.
#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRow {
    id: String,
    buyer_id: String,
    status: OrderStatus,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// One `order_items` row joined with its product.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ItemRow {
    id: String,
    quantity: i64,
    unit_price_cents: i64,
    created_at: DateTime<Utc>,
    product_id: String,
    product_name: String,
    product_description: Option<String>,
    product_price_cents: i64,
    product_stock: i64,
    product_seller_id: String,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            id: self.id,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            product: Product {
                id: self.product_id,
                name: self.product_name,
                description: self.product_description,
                price_cents: self.product_price_cents,
                stock: self.product_stock,
                seller_id: self.product_seller_id,
                created_at: self.product_created_at,
                updated_at: self.product_updated_at,
            },
            created_at: self.created_at,
        }
    }
}

const ITEMS_SQL: &str = r#"
    SELECT i.id, i.quantity, i.unit_price_cents, i.created_at,
           p.id          AS product_id,
           p.name        AS product_name,
           p.description AS product_description,
           p.price_cents AS product_price_cents,
           p.stock       AS product_stock,
           p.seller_id   AS product_seller_id,
           p.created_at  AS product_created_at,
           p.updated_at  AS product_updated_at
    FROM order_items i
    INNER JOIN products p ON p.id = i.product_id
    WHERE i.order_id = ?1
    ORDER BY i.created_at
"#;

async fn load_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, ItemRow>(ITEMS_SQL)
        .bind(order_id)
        .fetch_all(conn)
        .await?;

    Ok(rows.into_iter().map(ItemRow::into_item).collect())
}

async fn into_aggregate(conn: &mut SqliteConnection, row: OrderRow) -> DbResult<Order> {
    let items = load_items(conn, &row.id).await?;
    Ok(Order {
        id: row.id,
        buyer_id: row.buyer_id,
        status: row.status,
        total_cents: row.total_cents,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

// =============================================================================
// Transaction-Scoped Operations
// =============================================================================

/// Loads a full order aggregate inside the caller's active transaction.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT id, buyer_id, status, total_cents, created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(into_aggregate(conn, row).await?)),
        None => Ok(None),
    }
}

/// Persists a freshly constructed order and all of its items.
///
/// Runs inside the caller's creation transaction, after every stock
/// deduction succeeded; commit/rollback is the caller's decision.
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, items = order.items.len(), "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (id, buyer_id, status, total_cents, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&order.id)
    .bind(&order.buyer_id)
    .bind(order.status)
    .bind(order.total_cents)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&order.id)
        .bind(&item.product.id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Sets an order's status inside the caller's transaction.
pub async fn set_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: OrderStatus,
) -> DbResult<()> {
    debug!(id = %id, status = %status, "Updating order status");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", id));
    }

    Ok(())
}

// =============================================================================
// Pool-Backed Repository
// =============================================================================

/// Repository for order reads and single-statement mutations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets a full order aggregate by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Sets an order's status (non-transactional path for updateStatus,
    /// which never touches stock).
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        set_status(&mut conn, id, status).await
    }

    /// Lists all orders, newest first.
    pub async fn list_all(&self, page: Page) -> DbResult<(Vec<Order>, i64)> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&mut *conn)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, buyer_id, status, total_cents, created_at, updated_at
            FROM orders
            ORDER BY created_at DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(into_aggregate(&mut conn, row).await?);
        }

        Ok((orders, total))
    }

    /// Lists orders placed by the given buyer, newest first.
    pub async fn list_by_buyer(&self, buyer_id: &str, page: Page) -> DbResult<(Vec<Order>, i64)> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = ?1")
            .bind(buyer_id)
            .fetch_one(&mut *conn)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, buyer_id, status, total_cents, created_at, updated_at
            FROM orders
            WHERE buyer_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(buyer_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(into_aggregate(&mut conn, row).await?);
        }

        Ok((orders, total))
    }

    /// Lists orders containing at least one product listed by the given
    /// seller, newest first.
    pub async fn list_by_seller(&self, seller_id: &str, page: Page) -> DbResult<(Vec<Order>, i64)> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT o.id)
            FROM orders o
            INNER JOIN order_items i ON i.order_id = o.id
            INNER JOIN products p ON p.id = i.product_id
            WHERE p.seller_id = ?1
            "#,
        )
        .bind(seller_id)
        .fetch_one(&mut *conn)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT DISTINCT o.id, o.buyer_id, o.status, o.total_cents,
                   o.created_at, o.updated_at
            FROM orders o
            INNER JOIN order_items i ON i.order_id = o.id
            INNER JOIN products p ON p.id = i.product_id
            WHERE p.seller_id = ?1
            ORDER BY o.created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(seller_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(into_aggregate(&mut conn, row).await?);
        }

        Ok((orders, total))
    }

    /// Counts orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
