//! Status and option enums for catalog, cart and order documents.
//!
//! Order statuses carry their own transition rules so that every writer
//! (webhook reconciliation, admin fulfilment updates) enforces the same
//! state machine.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move {kind} status from {from} to {to}")]
pub struct StatusTransitionError {
    /// Which status machine rejected the change.
    pub kind: &'static str,
    /// Current status.
    pub from: &'static str,
    /// Requested status.
    pub to: &'static str,
}

/// Payment state of an order.
///
/// ```text
/// pending ──► paid
///    │         ▲
///    └─► failed┘
/// ```
///
/// `paid` is terminal: a paid order never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    /// Whether moving to `next` is allowed.
    ///
    /// A failed intent may still succeed when the customer retries it.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Failed) | (Self::Failed, Self::Paid)
        )
    }

    /// Validate a transition to `next`.
    ///
    /// # Errors
    ///
    /// Returns `StatusTransitionError` if the move is not allowed.
    pub const fn transition(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                kind: "payment",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfilment state of an order.
///
/// ```text
/// created ─► processing ─► shipped ─► delivered
/// created | processing              ─► cancelled
/// created | processing | shipped | delivered ─► refunded
/// ```
///
/// `refunded` is reachable from any non-cancelled state (the payment check
/// lives with the caller). `cancelled` and `refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfilmentStatus {
    #[default]
    Created,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl FulfilmentStatus {
    /// Wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Whether no further changes are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    /// Whether moving to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Processing | Self::Cancelled | Self::Refunded)
                | (Self::Processing, Self::Shipped | Self::Cancelled | Self::Refunded)
                | (Self::Shipped, Self::Delivered | Self::Refunded)
                | (Self::Delivered, Self::Refunded)
        )
    }

    /// Validate a transition to `next`.
    ///
    /// # Errors
    ///
    /// Returns `StatusTransitionError` if the move is not allowed.
    pub const fn transition(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                kind: "fulfilment",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl fmt::Display for FulfilmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog lifecycle of a product. Only `published` products are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
}

impl ProductStatus {
    /// Wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

/// Shipping method chosen for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

impl ShippingMethod {
    /// Wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }
}

/// Print orientation, used as a catalog filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
    Square,
}

impl Orientation {
    /// Wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
            Self::Square => "square",
        }
    }
}

/// Frame add-on selection for a print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrameChoice {
    #[default]
    None,
    Black,
    White,
}
