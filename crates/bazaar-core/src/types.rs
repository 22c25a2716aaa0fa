//! # Domain Types
//!
//! Core domain types for the order fulfillment engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Domain Types                          │
//! │                                                             │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐  │
//! │  │     Order     │   │   OrderItem   │   │    Product    │  │
//! │  │  ──────────── │   │  ──────────── │   │  ──────────── │  │
//! │  │  id (UUID)    │──►│  quantity     │──►│  price_cents  │  │
//! │  │  buyer_id     │   │  unit_price_  │   │  stock        │  │
//! │  │  status       │   │    cents      │   │  seller_id    │  │
//! │  │  total_cents  │   │  product      │   │               │  │
//! │  └───────────────┘   └───────────────┘   └───────────────┘  │
//! │                                                             │
//! │  ┌───────────────┐   ┌───────────────┐                      │
//! │  │    Caller     │   │  OrderStatus  │                      │
//! │  │  ──────────── │   │  ──────────── │                      │
//! │  │  id           │   │  Pending      │                      │
//! │  │  role         │   │  Accepted     │                      │
//! │  └───────────────┘   │  Delivered    │                      │
//! │                      │  Canceled     │                      │
//! │                      └───────────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Order` is the aggregate root: it owns its items exclusively, and each
//! item carries a frozen `unit_price_cents` snapshot taken at purchase
//! time. The snapshot is never re-derived from the current product price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Caller Identity
// =============================================================================

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular marketplace user (may be buyer and seller simultaneously).
    User,
    /// Administrator with unrestricted access.
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// The authenticated actor invoking an operation.
///
/// Supplied by the (external) identity layer; this core trusts the value
/// as already authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    /// A regular user identity.
    pub fn user(id: impl Into<String>) -> Self {
        Caller {
            id: id.into(),
            role: Role::User,
        }
    }

    /// An administrator identity.
    pub fn admin(id: impl Into<String>) -> Self {
        Caller {
            id: id.into(),
            role: Role::Admin,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product, referenced (not owned) by order items.
///
/// The catalog itself is maintained outside the order engine; this type is
/// the row shape the engine reads and whose `stock` counter it mutates
/// inside order transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Current unit price in cents.
    pub price_cents: i64,

    /// Available-for-sale unit count. Never negative.
    pub stock: i64,

    /// Identity that listed this product.
    pub seller_id: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the current price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can be fulfilled.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// Transitions are governed by the state machine in [`crate::status`];
/// no other mutation path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order created, awaiting the seller's confirmation.
    Pending,
    /// Seller accepted the order.
    Accepted,
    /// Order delivered to the buyer (terminal).
    Delivered,
    /// Order canceled by buyer or admin (terminal).
    Canceled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    /// Stable lowercase name, matching the stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Aggregate
// =============================================================================

/// A line within an order.
///
/// `unit_price_cents` is the price snapshot taken when the order was
/// created; the embedded `product` reflects the catalog's *current* state
/// and may show a different price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    /// Units purchased. Always >= 1.
    pub quantity: i64,
    /// Unit price in cents at the moment of purchase (frozen).
    pub unit_price_cents: i64,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (frozen unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }
}

/// A buyer's purchase transaction: the aggregate root.
///
/// Always loaded with its items and their products resolved, so access
/// control can see every item's seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub status: OrderStatus,
    /// Sum of line totals, computed once at creation. Never recomputed.
    pub total_cents: i64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// True if the given identity sells at least one product in this order.
    pub fn has_seller(&self, seller_id: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.product.seller_id == seller_id)
    }
}

/// One requested line of a new order: which product, how many units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: i64,
}

impl NewOrderLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        NewOrderLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// A page request for listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a page request, clamping out-of-range values instead of
    /// failing: page 0 becomes 1, limit is capped at [`Self::MAX_LIMIT`].
    pub fn new(page: u32, limit: u32) -> Self {
        Page {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Row offset for this page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata returned alongside a page of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    /// Total matching rows across all pages.
    pub total: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    /// Derives the metadata for a page request against a total row count.
    pub fn compute(page: Page, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page.limit as i64 - 1) / page.limit as i64
        };
        PageMeta {
            page: page.page,
            limit: page.limit,
            total,
            total_pages,
            has_next_page: (page.page as i64) < total_pages,
            has_previous_page: page.page > 1,
        }
    }
}

/// A page of data plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(seller_id: &str) -> Product {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        Product {
            id: "p1".to_string(),
            name: "Widget".to_string(),
            description: None,
            price_cents: 1099,
            stock: 10,
            seller_id: seller_id.to_string(),
            created_at: t,
            updated_at: t,
        }
    }

    fn order_with_seller(seller_id: &str) -> Order {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        Order {
            id: "o1".to_string(),
            buyer_id: "b1".to_string(),
            status: OrderStatus::Pending,
            total_cents: 2198,
            items: vec![OrderItem {
                id: "i1".to_string(),
                quantity: 2,
                unit_price_cents: 1099,
                product: product(seller_id),
                created_at: t,
            }],
            created_at: t,
            updated_at: t,
        }
    }

    #[test]
    fn test_line_total_uses_frozen_price() {
        let mut order = order_with_seller("s1");
        // Catalog price moved after purchase; snapshot must not.
        order.items[0].product.price_cents = 9999;
        assert_eq!(order.items[0].line_total().cents(), 2198);
    }

    #[test]
    fn test_has_seller() {
        let order = order_with_seller("s1");
        assert!(order.has_seller("s1"));
        assert!(!order.has_seller("b1"));
        assert!(!order.has_seller("someone-else"));
    }

    #[test]
    fn test_page_clamping() {
        let p = Page::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);

        let p = Page::new(3, 10_000);
        assert_eq!(p.limit, Page::MAX_LIMIT);
        assert_eq!(p.offset(), 2 * Page::MAX_LIMIT as i64);
    }

    #[test]
    fn test_page_meta() {
        let meta = PageMeta::compute(Page::new(2, 10), 35);
        assert_eq!(meta.total_pages, 4);
        assert!(meta.has_next_page);
        assert!(meta.has_previous_page);

        let meta = PageMeta::compute(Page::new(1, 10), 5);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);

        let meta = PageMeta::compute(Page::new(1, 10), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let order = order_with_seller("s1");
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("buyerId").is_some());
        assert!(json.get("totalCents").is_some());
        assert_eq!(json["status"], "pending");
        let item = &json["items"][0];
        assert!(item.get("unitPriceCents").is_some());
        assert!(item["product"].get("sellerId").is_some());
    }
}
