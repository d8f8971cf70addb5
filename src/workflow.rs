//! Order status state machine.
//!
//! Two independent transition tables apply depending on which party is
//! acting on the order. The vendor side can reopen a cancelled order;
//! the customer side cannot, but may repeat `cancelled -> cancelled`
//! as an idempotent archival marker. Nothing ever leaves `completed`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

/// The party acting on an order, derived from the caller's relationship
/// to the record, not from the role string alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActor {
    Customer,
    Vendor,
}

impl OrderActor {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderActor::Customer => "customer",
            OrderActor::Vendor => "vendor",
        }
    }
}

/// Whether `actor` may move an order from `from` to `to`.
///
/// The match is deliberately exhaustive over both tables so that adding
/// a status or an actor forces every edge to be reconsidered.
pub fn transition_allowed(actor: OrderActor, from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match actor {
        OrderActor::Vendor => match (from, to) {
            (Pending, Accepted) | (Pending, Cancelled) => true,
            (Accepted, Completed) | (Accepted, Cancelled) => true,
            // Reopen path: asymmetric with the customer table on purpose.
            (Cancelled, Accepted) => true,
            (Completed, _) => false,
            (Pending, _) | (Accepted, _) | (Cancelled, _) => false,
        },
        OrderActor::Customer => match (from, to) {
            (Pending, Cancelled) | (Accepted, Cancelled) => true,
            // Idempotent re-cancel, used to mark the order archived.
            (Cancelled, Cancelled) => true,
            (Completed, _) => false,
            (Pending, _) | (Accepted, _) | (Cancelled, _) => false,
        },
    }
}

/// Validate a transition, surfacing the attempted edge on failure.
pub fn check_transition(
    actor: OrderActor,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<(), AppError> {
    if transition_allowed(actor, from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

/// The customer's repeated cancel is the archival marker.
pub fn marks_archived(actor: OrderActor, from: OrderStatus, to: OrderStatus) -> bool {
    actor == OrderActor::Customer && from == OrderStatus::Cancelled && to == OrderStatus::Cancelled
}

/// Human-readable audit line recorded in the acting party's comment.
pub fn status_audit_line(status: OrderStatus, actor: OrderActor) -> String {
    format!("Order status changed to {} by {}", status, actor.as_str())
}

/// Comments are append-only logs: a new entry goes on its own line and
/// never replaces what is already there.
pub fn append_comment(existing: &str, entry: &str) -> String {
    if existing.is_empty() {
        entry.to_string()
    } else {
        format!("{existing}\n{entry}")
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    const STATUSES: [OrderStatus; 4] = [Pending, Accepted, Completed, Cancelled];

    #[test]
    fn vendor_table_matches_allowed_edges() {
        let allowed = [
            (Pending, Accepted),
            (Pending, Cancelled),
            (Accepted, Completed),
            (Accepted, Cancelled),
            (Cancelled, Accepted),
        ];
        for from in STATUSES {
            for to in STATUSES {
                assert_eq!(
                    transition_allowed(OrderActor::Vendor, from, to),
                    allowed.contains(&(from, to)),
                    "vendor {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn customer_table_matches_allowed_edges() {
        let allowed = [
            (Pending, Cancelled),
            (Accepted, Cancelled),
            (Cancelled, Cancelled),
        ];
        for from in STATUSES {
            for to in STATUSES {
                assert_eq!(
                    transition_allowed(OrderActor::Customer, from, to),
                    allowed.contains(&(from, to)),
                    "customer {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn completed_is_terminal_for_both_parties() {
        for actor in [OrderActor::Vendor, OrderActor::Customer] {
            for to in STATUSES {
                assert!(!transition_allowed(actor, Completed, to));
            }
        }
    }

    #[test]
    fn only_customer_recancel_marks_archived() {
        assert!(marks_archived(OrderActor::Customer, Cancelled, Cancelled));
        assert!(!marks_archived(OrderActor::Vendor, Cancelled, Accepted));
        assert!(!marks_archived(OrderActor::Customer, Pending, Cancelled));
    }

    #[test]
    fn rejected_transition_carries_the_edge() {
        let err = check_transition(OrderActor::Customer, Pending, Accepted).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, Pending);
                assert_eq!(to, Accepted);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn audit_line_format() {
        assert_eq!(
            status_audit_line(Accepted, OrderActor::Vendor),
            "Order status changed to accepted by vendor"
        );
        assert_eq!(
            status_audit_line(Cancelled, OrderActor::Customer),
            "Order status changed to cancelled by customer"
        );
    }

    #[test]
    fn comments_are_append_only() {
        let first = append_comment("", "A");
        assert_eq!(first, "A");
        let second = append_comment(&first, "B");
        assert_eq!(second, "A\nB");
    }
}
