//! Fixed-width identifiers and scalars shared across the matching core.

use serde::{Deserialize, Serialize};

/// Unique, externally assigned identifier for an order. Must not collide
/// with any currently-resting order.
pub type OrderId = u64;

/// Price in integer ticks. Positive by convention for resting limit orders;
/// market orders carry a sentinel value assigned on acceptance (see
/// [`crate::matching`]).
pub type Price = i64;

/// Unsigned order size. Zero is invalid on input.
pub type Quantity = u64;

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// The side an order on this side matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// Order-type policy enforced by the matching loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Rests indefinitely until explicitly cancelled.
    GoodTillCancel,
    /// Executes immediately against available liquidity; residual is cancelled.
    FillAndKill,
    /// Executes fully immediately or is rejected entirely without resting.
    FillOrKill,
    /// Rests until externally expired at session close.
    GoodForDay,
    /// Executes against any available liquidity at any price; never rests.
    Market,
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
}
