//! # Order Status State Machine
//!
//! Pure transition rules for the order lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Order Lifecycle                          │
//! │                                                             │
//! │              ┌──────────┐                                   │
//! │              │ pending  │  (initial)                        │
//! │              └────┬─────┘                                   │
//! │           accept  │    │  cancel                            │
//! │         ┌─────────┘    └─────────┐                          │
//! │         ▼                        ▼                          │
//! │   ┌──────────┐            ┌──────────┐                      │
//! │   │ accepted │──cancel───►│ canceled │  (terminal)          │
//! │   └────┬─────┘            └──────────┘                      │
//! │        │ deliver                                            │
//! │        ▼                                                    │
//! │  ┌───────────┐                                              │
//! │  │ delivered │  (terminal)                                  │
//! │  └───────────┘                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table is pure data; [`validate_transition`] is the single
//! operation this component exposes.

use crate::error::{OrderError, OrderResult};
use crate::types::OrderStatus;

impl OrderStatus {
    /// Legal targets from this status.
    pub const fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Accepted, OrderStatus::Canceled],
            OrderStatus::Accepted => &[OrderStatus::Delivered, OrderStatus::Canceled],
            OrderStatus::Delivered => &[],
            OrderStatus::Canceled => &[],
        }
    }

    /// True if no transition leaves this status.
    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

/// Validates a requested status change against the transition table.
///
/// Returns [`OrderError::InvalidTransition`] carrying the attempted
/// from/to pair and the allowed set for diagnostics.
pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> OrderResult<()> {
    let allowed = from.allowed_transitions();
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to, allowed })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use OrderStatus::*;

    #[test]
    fn test_legal_transitions() {
        assert!(validate_transition(Pending, Accepted).is_ok());
        assert!(validate_transition(Pending, Canceled).is_ok());
        assert!(validate_transition(Accepted, Delivered).is_ok());
        assert!(validate_transition(Accepted, Canceled).is_ok());
    }

    #[test]
    fn test_table_completeness() {
        // Every (from, to) pair not in the table must fail.
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let result = validate_transition(from, to);
                if from.allowed_transitions().contains(&to) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
                    match err {
                        OrderError::InvalidTransition {
                            from: f,
                            to: t,
                            allowed,
                        } => {
                            assert_eq!(f, from);
                            assert_eq!(t, to);
                            assert_eq!(allowed, from.allowed_transitions());
                        }
                        other => panic!("unexpected error: {other}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!Pending.is_terminal());
        assert!(!Accepted.is_terminal());
        assert!(Delivered.is_terminal());
        assert!(Canceled.is_terminal());
    }

    #[test]
    fn test_no_self_transitions() {
        for status in OrderStatus::ALL {
            assert!(validate_transition(status, status).is_err());
        }
    }

    #[test]
    fn test_accepted_cannot_return_to_pending() {
        let err = validate_transition(Accepted, Pending).unwrap_err();
        assert!(err.to_string().contains("from \"accepted\" to \"pending\""));
    }
}
