//! Trade records produced by the matching loop.
//!
//! Grounded on the teacher's `trade.rs`, extended with [`TradeLeg`]: each leg
//! carries the price its own order was resting at, since a crossing
//! aggressor and a passive maker can record different prices for the same
//! fill (SPEC_FULL.md §4.4) — the teacher's flat `price` field on one
//! `Trade` per fill can't express that.

use serde::{Deserialize, Serialize};

use crate::types::{OrderId, Price, Quantity};

/// One side's view of a single fill: the order involved, the price it was
/// resting at, and the quantity exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLeg {
    pub order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
}

/// A completed match between a resting bid and a resting ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub bid: TradeLeg,
    pub ask: TradeLeg,
    pub traded_at_millis: u64,
}

impl Trade {
    pub fn quantity(&self) -> Quantity {
        self.bid.quantity
    }
}
