//! # Order Engine
//!
//! The root orchestrator: composes the stock ledger, price snapshotting,
//! the status state machine, and access control into atomic operations.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Order Lifecycle                         │
//! │                                                             │
//! │  1. CREATE (one transaction)                                │
//! │     └── per line: load product → check stock → reject       │
//! │         self-purchase → deduct stock → snapshot price       │
//! │     └── insert order (pending) + items, commit              │
//! │                                                             │
//! │  2. SELLER DRIVES STATUS                                    │
//! │     └── update_status() → accepted → delivered              │
//! │         (never touches stock)                               │
//! │                                                             │
//! │  3. (OPTIONAL) BUYER CANCELS (one transaction)              │
//! │     └── only while pending; restores every line's stock     │
//! │         and sets canceled, or rolls back entirely           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! Domain errors ([`OrderError`]) pass through to the caller untouched,
//! including `NotFound`/`Forbidden` raised mid-operation. Infrastructure
//! failures are logged with full detail here and collapse into the opaque
//! [`OrderError::Internal`]; no storage detail leaks to callers. Every
//! multi-step mutation runs in one transaction: dropping an uncommitted
//! `sqlx` transaction rolls it back, so an early `?` return can never
//! leave partial state behind.

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{order, product};
use bazaar_core::{
    access, status, validation, Caller, Money, NewOrderLine, Order, OrderError, OrderItem,
    OrderResult, OrderStatus, Page, PageMeta, Paginated,
};

/// The order fulfillment engine.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./bazaar.db")).await?;
/// let engine = OrderEngine::new(db);
///
/// let order = engine
///     .create(&caller, &[NewOrderLine::new(product_id, 2)])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderEngine {
    db: Database,
}

impl OrderEngine {
    /// Creates a new engine over the given database handle.
    pub fn new(db: Database) -> Self {
        OrderEngine { db }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Creates a new order for the caller.
    ///
    /// Inside one transaction, for each requested line: load the product
    /// (`ProductNotFound` if absent), check stock (`InsufficientStock`),
    /// reject self-purchase (`SelfPurchase`), deduct stock, and snapshot
    /// the current unit price onto the line. The order is persisted as
    /// `pending` together with all items; any failure rolls everything
    /// back: no partial stock deduction, no partial order.
    pub async fn create(&self, caller: &Caller, lines: &[NewOrderLine]) -> OrderResult<Order> {
        debug!(buyer = %caller.id, lines = lines.len(), "Creating order");

        validation::validate_order_lines(lines)?;

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| unexpected("opening creation transaction", e.into()))?;

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let mut total = Money::zero();
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let product = product::fetch(&mut tx, &line.product_id)
                .await
                .map_err(|e| unexpected("loading product", e))?
                .ok_or_else(|| OrderError::ProductNotFound(line.product_id.clone()))?;

            if !product.has_stock(line.quantity) {
                return Err(OrderError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                    requested: line.quantity,
                });
            }

            if product.seller_id == caller.id {
                return Err(OrderError::SelfPurchase { name: product.name });
            }

            let affected = product::deduct_stock(&mut tx, &product.id, line.quantity)
                .await
                .map_err(|e| unexpected("deducting stock", e))?;
            if affected == 0 {
                // A concurrent transaction consumed the stock between our
                // read and the guarded update.
                return Err(OrderError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                    requested: line.quantity,
                });
            }

            // Price snapshot: the unit price read in this same transaction
            // is frozen onto the item, decoupled from later price changes.
            total += product.price() * line.quantity;
            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                quantity: line.quantity,
                unit_price_cents: product.price_cents,
                product,
                created_at: now,
            });
        }

        let order = Order {
            id: order_id.clone(),
            buyer_id: caller.id.clone(),
            status: OrderStatus::Pending,
            total_cents: total.cents(),
            items,
            created_at: now,
            updated_at: now,
        };

        order::insert(&mut tx, &order)
            .await
            .map_err(|e| unexpected("inserting order", e))?;

        tx.commit()
            .await
            .map_err(|e| unexpected("committing creation transaction", e.into()))?;

        info!(
            order_id = %order_id,
            buyer = %caller.id,
            total = %total,
            "Order created"
        );

        // Return the fully-loaded aggregate with current product state.
        self.load(&order_id).await
    }

    /// Loads one order, enforcing read access.
    pub async fn find_one(&self, id: &str, caller: &Caller) -> OrderResult<Order> {
        let order = self.load(id).await?;

        if !access::can_access(&order, caller) {
            return Err(OrderError::Forbidden(
                "You do not have permission to access this order".to_string(),
            ));
        }

        Ok(order)
    }

    /// Lists all orders, newest first. Restricting this to admins is the
    /// transport layer's responsibility.
    pub async fn find_all(&self, page: Page) -> OrderResult<Paginated<Order>> {
        let (data, total) = self
            .db
            .orders()
            .list_all(page)
            .await
            .map_err(|e| unexpected("listing orders", e))?;

        Ok(Paginated {
            data,
            meta: PageMeta::compute(page, total),
        })
    }

    /// Lists the caller's own orders, newest first.
    pub async fn find_my_orders(&self, caller: &Caller, page: Page) -> OrderResult<Paginated<Order>> {
        let (data, total) = self
            .db
            .orders()
            .list_by_buyer(&caller.id, page)
            .await
            .map_err(|e| unexpected("listing buyer orders", e))?;

        Ok(Paginated {
            data,
            meta: PageMeta::compute(page, total),
        })
    }

    /// Lists orders containing at least one of the caller's products,
    /// newest first.
    pub async fn find_my_sales(&self, caller: &Caller, page: Page) -> OrderResult<Paginated<Order>> {
        let (data, total) = self
            .db
            .orders()
            .list_by_seller(&caller.id, page)
            .await
            .map_err(|e| unexpected("listing seller orders", e))?;

        Ok(Paginated {
            data,
            meta: PageMeta::compute(page, total),
        })
    }

    /// Updates an order's status.
    ///
    /// Only sellers of products in the order (or admins) may drive the
    /// status, and only along the transition table. Stock is never
    /// touched here: stock changes happen at creation and cancellation
    /// only.
    pub async fn update_status(
        &self,
        id: &str,
        new_status: OrderStatus,
        caller: &Caller,
    ) -> OrderResult<Order> {
        let order = self.load(id).await?;

        if !access::can_mutate_status(&order, caller) {
            return Err(OrderError::Forbidden(
                "Only sellers of products in this order or admins can update its status"
                    .to_string(),
            ));
        }

        status::validate_transition(order.status, new_status)?;

        self.db
            .orders()
            .set_status(id, new_status)
            .await
            .map_err(|e| unexpected("persisting status", e))?;

        info!(order_id = %id, from = %order.status, to = %new_status, "Order status updated");

        self.load(id).await
    }

    /// Cancels a pending order, restoring every line's stock.
    ///
    /// Only the buyer (or an admin) may cancel, and only while the order
    /// is still `pending` (stricter than the general transition table,
    /// enforced explicitly). Stock restoration and the status flip commit
    /// as one transaction; if any product row has meanwhile disappeared
    /// the whole cancellation rolls back as an internal failure.
    pub async fn cancel(&self, id: &str, caller: &Caller) -> OrderResult<Order> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| unexpected("opening cancellation transaction", e.into()))?;

        let order = order::fetch(&mut tx, id)
            .await
            .map_err(|e| unexpected("loading order", e))?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))?;

        if !access::can_cancel(&order, caller) {
            return Err(OrderError::Forbidden(
                "You can only cancel your own orders".to_string(),
            ));
        }

        if order.status != OrderStatus::Pending {
            return Err(OrderError::NotCancelable {
                status: order.status,
            });
        }

        for item in &order.items {
            product::restore_stock(&mut tx, &item.product.id, item.quantity)
                .await
                .map_err(|e| unexpected("restoring stock", e))?;
        }

        order::set_status(&mut tx, id, OrderStatus::Canceled)
            .await
            .map_err(|e| unexpected("persisting cancellation", e))?;

        tx.commit()
            .await
            .map_err(|e| unexpected("committing cancellation transaction", e.into()))?;

        info!(order_id = %id, caller = %caller.id, "Order canceled, stock restored");

        self.load(id).await
    }

    /// Counts orders (for diagnostics).
    pub async fn count(&self) -> OrderResult<i64> {
        self.db
            .orders()
            .count()
            .await
            .map_err(|e| unexpected("counting orders", e))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Loads a full aggregate or reports `OrderNotFound`.
    async fn load(&self, id: &str) -> OrderResult<Order> {
        self.db
            .orders()
            .get_by_id(id)
            .await
            .map_err(|e| unexpected("loading order", e))?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))
    }
}

/// Collapses an infrastructure failure into the opaque domain error,
/// keeping the detail in server-side logs only.
fn unexpected(context: &'static str, err: DbError) -> OrderError {
    error!(context, error = %err, "Unexpected error in order engine");
    OrderError::Internal
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use bazaar_core::{ErrorKind, Product};
    use std::time::Duration;

    async fn engine() -> OrderEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        OrderEngine::new(db)
    }

    fn listing(id: &str, name: &str, price_cents: i64, stock: i64, seller: &str) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            price_cents,
            stock,
            seller_id: seller.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed(engine: &OrderEngine, product: Product) {
        engine.database().products().insert(&product).await.unwrap();
    }

    async fn stock_of(engine: &OrderEngine, id: &str) -> i64 {
        engine
            .database()
            .products()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_create_snapshots_price_and_deducts_stock() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let buyer = Caller::user("b1");
        let order = engine
            .create(&buyer, &[NewOrderLine::new("p1", 2)])
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.buyer_id, "b1");
        assert_eq!(order.total_cents, 2198); // 2 × 10.99 = 21.98
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].unit_price_cents, 1099);
        assert_eq!(order.items[0].product.seller_id, "s1");

        assert_eq!(stock_of(&engine, "p1").await, 8);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_order() {
        let engine = engine().await;
        let err = engine.create(&Caller::user("b1"), &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_product() {
        let engine = engine().await;
        let err = engine
            .create(&Caller::user("b1"), &[NewOrderLine::new("missing", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound(ref id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_create_rejects_insufficient_stock() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let err = engine
            .create(&Caller::user("b1"), &[NewOrderLine::new("p1", 11)])
            .await
            .unwrap_err();

        match err {
            OrderError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("unexpected error: {other}"),
        }

        // No stock mutation on rejection.
        assert_eq!(stock_of(&engine, "p1").await, 10);
    }

    #[tokio::test]
    async fn test_create_rejects_self_purchase() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let err = engine
            .create(&Caller::user("s1"), &[NewOrderLine::new("p1", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::SelfPurchase { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(stock_of(&engine, "p1").await, 10);
    }

    #[tokio::test]
    async fn test_create_rolls_back_all_lines_on_failure() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 5, "s1")).await;
        seed(&engine, listing("p2", "Gadget", 500, 1, "s2")).await;

        // First line would succeed; second fails on stock. Everything
        // must roll back.
        let err = engine
            .create(
                &Caller::user("b1"),
                &[NewOrderLine::new("p1", 2), NewOrderLine::new("p2", 3)],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock { .. }));
        assert_eq!(stock_of(&engine, "p1").await, 5);
        assert_eq!(stock_of(&engine, "p2").await, 1);
        assert_eq!(engine.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_exactly_once() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let buyer = Caller::user("b1");
        let order = engine
            .create(&buyer, &[NewOrderLine::new("p1", 2)])
            .await
            .unwrap();
        assert_eq!(stock_of(&engine, "p1").await, 8);

        let canceled = engine.cancel(&order.id, &buyer).await.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(stock_of(&engine, "p1").await, 10);

        // A second cancel must not restore stock again.
        let err = engine.cancel(&order.id, &buyer).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(stock_of(&engine, "p1").await, 10);
    }

    #[tokio::test]
    async fn test_cancel_requires_buyer_or_admin() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let buyer = Caller::user("b1");
        let order = engine
            .create(&buyer, &[NewOrderLine::new("p1", 1)])
            .await
            .unwrap();

        // The seller may not cancel, nor may a stranger.
        for caller in [Caller::user("s1"), Caller::user("b2")] {
            let err = engine.cancel(&order.id, &caller).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden);
        }
        assert_eq!(stock_of(&engine, "p1").await, 9);

        // An admin may.
        engine.cancel(&order.id, &Caller::admin("root")).await.unwrap();
        assert_eq!(stock_of(&engine, "p1").await, 10);
    }

    #[tokio::test]
    async fn test_update_status_seller_flow() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let buyer = Caller::user("b1");
        let seller = Caller::user("s1");
        let order = engine
            .create(&buyer, &[NewOrderLine::new("p1", 2)])
            .await
            .unwrap();

        // Buyers cannot drive the status.
        let err = engine
            .update_status(&order.id, OrderStatus::Accepted, &buyer)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // The seller accepts.
        let accepted = engine
            .update_status(&order.id, OrderStatus::Accepted, &seller)
            .await
            .unwrap();
        assert_eq!(accepted.status, OrderStatus::Accepted);

        // Status updates never touch stock.
        assert_eq!(stock_of(&engine, "p1").await, 8);

        // Going back to pending is not in the transition table.
        let err = engine
            .update_status(&order.id, OrderStatus::Pending, &seller)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        // Delivered is terminal.
        engine
            .update_status(&order.id, OrderStatus::Delivered, &seller)
            .await
            .unwrap();
        let err = engine
            .update_status(&order.id, OrderStatus::Canceled, &seller)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_update_status_unknown_order() {
        let engine = engine().await;
        let err = engine
            .update_status("missing", OrderStatus::Accepted, &Caller::admin("root"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_find_one_access_scoping() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let buyer = Caller::user("b1");
        let order = engine
            .create(&buyer, &[NewOrderLine::new("p1", 1)])
            .await
            .unwrap();

        // Buyer, item seller, and admin can read.
        engine.find_one(&order.id, &buyer).await.unwrap();
        engine.find_one(&order.id, &Caller::user("s1")).await.unwrap();
        engine.find_one(&order.id, &Caller::admin("root")).await.unwrap();

        // Anyone else gets Forbidden, not NotFound.
        let err = engine
            .find_one(&order.id, &Caller::user("b2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = engine.find_one("missing", &buyer).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_price_change_does_not_rewrite_snapshot() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;

        let buyer = Caller::user("b1");
        let order = engine
            .create(&buyer, &[NewOrderLine::new("p1", 2)])
            .await
            .unwrap();

        engine.database().products().set_price("p1", 9999).await.unwrap();

        let reloaded = engine.find_one(&order.id, &buyer).await.unwrap();
        // Snapshot and total are frozen at purchase-time price...
        assert_eq!(reloaded.items[0].unit_price_cents, 1099);
        assert_eq!(reloaded.total_cents, 2198);
        // ...while the embedded product reflects the current catalog.
        assert_eq!(reloaded.items[0].product.price_cents, 9999);
    }

    #[tokio::test]
    async fn test_listing_scoping_and_pagination() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 50, "s1")).await;
        seed(&engine, listing("p2", "Gadget", 500, 50, "s2")).await;

        let b1 = Caller::user("b1");
        let b2 = Caller::user("b2");

        let first = engine.create(&b1, &[NewOrderLine::new("p1", 1)]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        engine.create(&b1, &[NewOrderLine::new("p2", 1)]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newest = engine.create(&b2, &[NewOrderLine::new("p1", 2)]).await.unwrap();

        // find_all: newest first, pagination meta math.
        let page = engine.find_all(Page::new(1, 2)).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].id, newest.id);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.total_pages, 2);
        assert!(page.meta.has_next_page);
        assert!(!page.meta.has_previous_page);

        let last = engine.find_all(Page::new(2, 2)).await.unwrap();
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.data[0].id, first.id);
        assert!(last.meta.has_previous_page);

        // Buyer scoping.
        let mine = engine.find_my_orders(&b1, Page::default()).await.unwrap();
        assert_eq!(mine.meta.total, 2);
        assert!(mine.data.iter().all(|o| o.buyer_id == "b1"));

        // Seller scoping: s1's product appears in two orders.
        let sales = engine
            .find_my_sales(&Caller::user("s1"), Page::default())
            .await
            .unwrap();
        assert_eq!(sales.meta.total, 2);
        assert!(sales.data.iter().all(|o| o.has_seller("s1")));

        // A seller with no sales sees an empty page.
        let none = engine
            .find_my_sales(&Caller::user("s3"), Page::default())
            .await
            .unwrap();
        assert_eq!(none.meta.total, 0);
        assert!(none.data.is_empty());
    }

    #[tokio::test]
    async fn test_extreme_price_total_saturates() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Monolith", i64::MAX, 10, "s1")).await;

        // The line total saturates instead of overflowing.
        let order = engine
            .create(&Caller::user("b1"), &[NewOrderLine::new("p1", 2)])
            .await
            .unwrap();

        assert_eq!(order.total_cents, i64::MAX);
        assert_eq!(order.items[0].unit_price_cents, i64::MAX);
        assert_eq!(stock_of(&engine, "p1").await, 8);
    }

    #[tokio::test]
    async fn test_multi_line_order_total() {
        let engine = engine().await;
        seed(&engine, listing("p1", "Widget", 1099, 10, "s1")).await;
        seed(&engine, listing("p2", "Gadget", 500, 10, "s2")).await;

        let order = engine
            .create(
                &Caller::user("b1"),
                &[NewOrderLine::new("p1", 2), NewOrderLine::new("p2", 3)],
            )
            .await
            .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_cents, 2 * 1099 + 3 * 500);
        assert_eq!(stock_of(&engine, "p1").await, 8);
        assert_eq!(stock_of(&engine, "p2").await, 7);
    }
}
