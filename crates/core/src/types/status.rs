//! Order lifecycle enums and the cancellation sub-state.
//!
//! The live order status only covers the four forward states. A terminated
//! order never stays in the `orders` table with a "cancelled" marker: the
//! cancellation workflow archives it and deletes the live row, so
//! `Cancelled` exists only as a *requested target* at the API boundary
//! ([`OrderStatusTarget`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a live order.
///
/// Transitions are one-directional: `Pending → Processing → Shipped →
/// Delivered`. Skipping forward is allowed; moving backward never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Position in the forward lifecycle, used to forbid regressions.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Shipped => 2,
            Self::Delivered => 3,
        }
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        next.rank() > self.rank()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        };
        write!(f, "{s}")
    }
}

/// Status an admin may request for an order.
///
/// `Pending` is not a valid target (orders start there and never return),
/// and `Cancelled` is a workflow trigger rather than a stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusTarget {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatusTarget {
    /// The stored status this target maps to, or `None` for `Cancelled`.
    #[must_use]
    pub const fn as_status(self) -> Option<OrderStatus> {
        match self {
            Self::Processing => Some(OrderStatus::Processing),
            Self::Shipped => Some(OrderStatus::Shipped),
            Self::Delivered => Some(OrderStatus::Delivered),
            Self::Cancelled => None,
        }
    }
}

impl core::fmt::Display for OrderStatusTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

/// Why an order ended up in the cancelled-order archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.cancellation_source", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CancellationSource {
    /// Cancelled directly by the user while still `Pending`.
    UserCancelled,
    /// User requested cancellation of a `Processing` order; admin approved.
    UserRequestedApproved,
    /// Cancelled by an admin, with or without a preceding request.
    AdminCancelled,
}

/// The cancellation sub-state attached to a live order.
///
/// This is a tagged union rather than a nullable embedded record: a live
/// order either has no cancellation activity, an unreviewed request, or a
/// rejected one. An *approved* request never appears here because approval
/// terminates the order into the archive. Persisted as JSONB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CancellationState {
    /// No cancellation activity on this order.
    #[default]
    None,
    /// User asked for cancellation; awaiting admin review.
    Requested {
        reason: String,
        requested_at: DateTime<Utc>,
    },
    /// Admin declined the request; the order continues its lifecycle.
    Rejected {
        reason: String,
        admin_reason: String,
        reviewed_at: DateTime<Utc>,
    },
}

impl CancellationState {
    /// Whether an unreviewed cancellation request is attached.
    #[must_use]
    pub const fn is_requested(&self) -> bool {
        matches!(self, Self::Requested { .. })
    }
}

/// Category of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.notification_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    System,
    Promo,
    Support,
    Chat,
}

/// Role carried in the auth token and stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_never_regresses() {
        use OrderStatus::{Delivered, Pending, Processing, Shipped};

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Delivered));

        assert!(!Processing.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Shipped));
    }

    #[test]
    fn cancelled_target_has_no_stored_status() {
        assert_eq!(OrderStatusTarget::Cancelled.as_status(), None);
        assert_eq!(
            OrderStatusTarget::Shipped.as_status(),
            Some(OrderStatus::Shipped)
        );
    }

    #[test]
    fn cancellation_state_round_trips_as_tagged_json() {
        let state = CancellationState::Requested {
            reason: "wrong size".to_owned(),
            requested_at: Utc::now(),
        };
        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["state"], "requested");
        let back: CancellationState = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, state);
        assert!(back.is_requested());

        let none = serde_json::to_value(CancellationState::None).expect("serialize");
        assert_eq!(none["state"], "none");
    }
}
