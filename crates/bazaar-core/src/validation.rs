//! # Validation Module
//!
//! Input validation for order creation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Validation Layers                         │
//! │                                                             │
//! │  Layer 1: Transport (excluded)                              │
//! │  ├── Shape/type validation (deserialization)                │
//! │  └── Authentication                                         │
//! │           │                                                 │
//! │           ▼                                                 │
//! │  Layer 2: THIS MODULE                                       │
//! │  ├── Non-empty item list                                    │
//! │  └── Per-line quantity bounds                               │
//! │           │                                                 │
//! │           ▼                                                 │
//! │  Layer 3: Order engine (inside the transaction)             │
//! │  ├── Product existence                                      │
//! │  ├── Stock availability                                     │
//! │  └── Self-purchase rejection                                │
//! │           │                                                 │
//! │           ▼                                                 │
//! │  Layer 4: Database (SQLite)                                 │
//! │  └── CHECK / FK constraints                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{OrderError, OrderResult};
use crate::types::NewOrderLine;
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// Validates the requested lines of a new order.
///
/// ## Rules
/// - At least one line ([`OrderError::EmptyOrder`])
/// - At most [`MAX_ORDER_LINES`] lines
/// - Every quantity in `1..=`[`MAX_LINE_QUANTITY`]
///
/// Product-level checks (existence, stock, self-purchase) happen inside
/// the creation transaction, not here.
pub fn validate_order_lines(lines: &[NewOrderLine]) -> OrderResult<()> {
    if lines.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    if lines.len() > MAX_ORDER_LINES {
        return Err(OrderError::TooManyLines {
            max: MAX_ORDER_LINES,
        });
    }

    for line in lines {
        if line.quantity < 1 || line.quantity > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity {
                requested: line.quantity,
                max: MAX_LINE_QUANTITY,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_order_rejected() {
        let err = validate_order_lines(&[]).unwrap_err();
        assert!(matches!(err, OrderError::EmptyOrder));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        for qty in [0, -1, -50] {
            let lines = [NewOrderLine::new("p1", qty)];
            let err = validate_order_lines(&lines).unwrap_err();
            assert!(matches!(err, OrderError::InvalidQuantity { .. }));
        }
    }

    #[test]
    fn test_excessive_quantity_rejected() {
        let lines = [NewOrderLine::new("p1", MAX_LINE_QUANTITY + 1)];
        assert!(validate_order_lines(&lines).is_err());
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let lines: Vec<_> = (0..=MAX_ORDER_LINES)
            .map(|i| NewOrderLine::new(format!("p{i}"), 1))
            .collect();
        let err = validate_order_lines(&lines).unwrap_err();
        assert!(matches!(err, OrderError::TooManyLines { .. }));
    }

    #[test]
    fn test_valid_lines_pass() {
        let lines = [
            NewOrderLine::new("p1", 1),
            NewOrderLine::new("p2", MAX_LINE_QUANTITY),
        ];
        assert!(validate_order_lines(&lines).is_ok());
    }
}
