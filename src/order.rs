//! The mutable order record, owned exclusively by the [`crate::book::OrderBook`]
//! that accepted it.
//!
//! Ported from the reference engine's `FillOrder`/`ToGoodTillCancel` pair, with
//! the per-order mutex dropped: the book serializes all mutation at its own
//! boundary (see SPEC_FULL.md §5), so an order never needs to defend itself
//! against concurrent access.

use crate::error::{NotAMarketOrderError, OrderError, OverfillError};
use crate::types::{OrderId, OrderStatus, OrderType, Price, Quantity, Side};

/// A single resting (or, mid-match, aggressing) order.
///
/// Invariant: `status == Filled` iff `remaining_quantity == 0`; a cancelled
/// order carries `status == Cancelled` and is never present in any index.
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    price: Price,
    side: Side,
    order_type: OrderType,
    initial_quantity: Quantity,
    remaining_quantity: Quantity,
    status: OrderStatus,
}

impl Order {
    /// Construct a new, unfilled order.
    ///
    /// Rejects non-positive quantity, and non-positive price on anything
    /// other than a `Market` order (market orders carry a sentinel price
    /// assigned on acceptance, not here).
    pub fn new(
        id: OrderId,
        price: Price,
        side: Side,
        order_type: OrderType,
        quantity: Quantity,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        if order_type != OrderType::Market && price <= 0 {
            return Err(OrderError::InvalidPrice);
        }

        Ok(Self {
            id,
            price,
            side,
            order_type,
            initial_quantity: quantity,
            remaining_quantity: quantity,
            status: OrderStatus::New,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn initial_quantity(&self) -> Quantity {
        self.initial_quantity
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Decrement remaining quantity by `quantity`, updating status.
    ///
    /// `quantity` must never exceed `remaining_quantity`; the matching loop
    /// that calls this treats `Err` as an engine bug and halts (SPEC_FULL.md
    /// §4.4 "Failure semantics").
    pub(crate) fn fill(&mut self, quantity: Quantity) -> Result<(), OverfillError> {
        if quantity > self.remaining_quantity {
            return Err(OverfillError {
                order_id: self.id,
                requested: quantity,
                remaining: self.remaining_quantity,
            });
        }

        self.remaining_quantity -= quantity;
        self.status = if self.remaining_quantity == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        Ok(())
    }

    /// Assign a concrete price to a `Market` order and retype it to
    /// `GoodTillCancel` for the duration of matching. Valid only on `Market`
    /// orders; anything else is a caller bug.
    pub(crate) fn promote_to_limit(&mut self, price: Price) -> Result<(), NotAMarketOrderError> {
        if self.order_type != OrderType::Market {
            return Err(NotAMarketOrderError(self.id));
        }
        self.price = price;
        self.order_type = OrderType::GoodTillCancel;
        Ok(())
    }

    pub(crate) fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gtc(id: OrderId, price: Price, qty: Quantity) -> Order {
        Order::new(id, price, Side::Bid, OrderType::GoodTillCancel, qty).unwrap()
    }

    #[test]
    fn rejects_zero_quantity() {
        assert_eq!(
            Order::new(1, 100, Side::Bid, OrderType::GoodTillCancel, 0).unwrap_err(),
            OrderError::InvalidQuantity
        );
    }

    #[test]
    fn rejects_non_positive_price_on_limit_orders() {
        assert_eq!(
            Order::new(1, 0, Side::Bid, OrderType::GoodTillCancel, 5).unwrap_err(),
            OrderError::InvalidPrice
        );
        assert_eq!(
            Order::new(1, -10, Side::Bid, OrderType::GoodTillCancel, 5).unwrap_err(),
            OrderError::InvalidPrice
        );
    }

    #[test]
    fn market_orders_may_have_a_non_positive_sentinel_price() {
        assert!(Order::new(1, 0, Side::Ask, OrderType::Market, 5).is_ok());
    }

    #[test]
    fn partial_then_full_fill_transitions_status() {
        let mut order = gtc(1, 100, 10);
        order.fill(4).unwrap();
        assert_eq!(order.status(), OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_quantity(), 6);
        assert_eq!(order.filled_quantity(), 4);

        order.fill(6).unwrap();
        assert_eq!(order.status(), OrderStatus::Filled);
        assert!(order.is_filled());
    }

    #[test]
    fn overfill_is_rejected_not_silently_clamped() {
        let mut order = gtc(1, 100, 5);
        let err = order.fill(6).unwrap_err();
        assert_eq!(err.order_id, 1);
        assert_eq!(err.requested, 6);
        assert_eq!(err.remaining, 5);
        // the failed fill must not have mutated the order
        assert_eq!(order.remaining_quantity(), 5);
    }

    #[test]
    fn promote_to_limit_only_valid_on_market_orders() {
        let mut market = Order::new(1, 0, Side::Bid, OrderType::Market, 10).unwrap();
        market.promote_to_limit(999).unwrap();
        assert_eq!(market.order_type(), OrderType::GoodTillCancel);
        assert_eq!(market.price(), 999);

        let mut limit = gtc(2, 100, 10);
        assert!(limit.promote_to_limit(50).is_err());
    }
}
