//! Error kinds for the matching core.
//!
//! `InvalidOrder` variants are rejected at construction and never reach the
//! book. `OverfillError` signals a matching-engine invariant violation and is
//! always `.expect()`-ed by the matching loop rather than propagated — an
//! overfill means the engine itself is broken, not that the caller did
//! anything wrong.

use thiserror::Error;

use crate::types::{OrderId, Quantity};

/// Rejected at [`crate::order::Order::new`] time; never reaches the book.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OrderError {
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("price must be positive for a non-market order")]
    InvalidPrice,
}

/// A matching-engine invariant violation: an attempt to fill an order for
/// more than its remaining quantity.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("order {order_id} cannot be filled for {requested} units; only {remaining} remain")]
pub struct OverfillError {
    pub order_id: OrderId,
    pub requested: Quantity,
    pub remaining: Quantity,
}

/// An order was promoted with [`crate::order::Order::promote_to_limit`] but
/// was not a `Market` order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("order {0} cannot have its price adjusted; only market orders may be promoted")]
pub struct NotAMarketOrderError(pub OrderId);
