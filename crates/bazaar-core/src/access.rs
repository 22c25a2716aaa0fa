//! # Access Control Evaluator
//!
//! Pure predicates deciding what a caller may do with an order.
//!
//! ## Who Can Do What
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Order Access Matrix                       │
//! │                                                             │
//! │               read    update status    cancel               │
//! │  admin         ✅          ✅            ✅                 │
//! │  buyer         ✅          ❌            ✅                 │
//! │  item seller   ✅          ✅            ❌                 │
//! │  anyone else   ❌          ❌            ❌                 │
//! │                                                             │
//! │  "item seller" = seller of at least one product in the      │
//! │  order. A user may be buyer of other orders and seller      │
//! │  here at the same time.                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! These predicates require the fully-loaded aggregate (items with their
//! products resolved); the engine guarantees orders are always loaded
//! that way.

use crate::types::{Caller, Order};

/// May the caller read this order?
///
/// Admins see everything; buyers see their own orders; sellers see orders
/// containing their products.
pub fn can_access(order: &Order, caller: &Caller) -> bool {
    if caller.is_admin() {
        return true;
    }
    if order.buyer_id == caller.id {
        return true;
    }
    order.has_seller(&caller.id)
}

/// May the caller change this order's status?
///
/// Only sellers of products in the order, or admins. Buyers drive the
/// lifecycle solely through cancellation.
pub fn can_mutate_status(order: &Order, caller: &Caller) -> bool {
    caller.is_admin() || order.has_seller(&caller.id)
}

/// May the caller cancel this order?
///
/// Only the buyer who placed it, or an admin.
pub fn can_cancel(order: &Order, caller: &Caller) -> bool {
    caller.is_admin() || order.buyer_id == caller.id
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderItem, OrderStatus, Product};
    use chrono::{TimeZone, Utc};

    /// Order bought by "buyer" containing one product sold by "seller".
    fn order() -> Order {
        let t = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        Order {
            id: "o1".to_string(),
            buyer_id: "buyer".to_string(),
            status: OrderStatus::Pending,
            total_cents: 2198,
            items: vec![OrderItem {
                id: "i1".to_string(),
                quantity: 2,
                unit_price_cents: 1099,
                product: Product {
                    id: "p1".to_string(),
                    name: "Widget".to_string(),
                    description: None,
                    price_cents: 1099,
                    stock: 8,
                    seller_id: "seller".to_string(),
                    created_at: t,
                    updated_at: t,
                },
                created_at: t,
            }],
            created_at: t,
            updated_at: t,
        }
    }

    #[test]
    fn test_read_access() {
        let order = order();
        assert!(can_access(&order, &Caller::admin("root")));
        assert!(can_access(&order, &Caller::user("buyer")));
        assert!(can_access(&order, &Caller::user("seller")));
        assert!(!can_access(&order, &Caller::user("stranger")));
    }

    #[test]
    fn test_status_mutation_access() {
        let order = order();
        assert!(can_mutate_status(&order, &Caller::admin("root")));
        assert!(can_mutate_status(&order, &Caller::user("seller")));
        // Buyers cannot drive the seller-side lifecycle.
        assert!(!can_mutate_status(&order, &Caller::user("buyer")));
        assert!(!can_mutate_status(&order, &Caller::user("stranger")));
    }

    #[test]
    fn test_cancel_access() {
        let order = order();
        assert!(can_cancel(&order, &Caller::admin("root")));
        assert!(can_cancel(&order, &Caller::user("buyer")));
        assert!(!can_cancel(&order, &Caller::user("seller")));
        assert!(!can_cancel(&order, &Caller::user("stranger")));
    }

    #[test]
    fn test_admin_role_beats_identity() {
        // An admin whose id matches nothing in the order still has access.
        let order = order();
        let admin = Caller::admin("unrelated-admin");
        assert!(can_access(&order, &admin));
        assert!(can_mutate_status(&order, &admin));
        assert!(can_cancel(&order, &admin));
    }
}
