//! The cross-and-fill loop and the public `submit`/`modify` operations that
//! drive it.
//!
//! Grounded on the teacher's `match_incoming_side`/`match_order`, generalized
//! from "market orders only" to the full order-type policy set (GTC, FAK,
//! FOK, GoodForDay, Market) the engine needs to enforce.

use tracing::{debug, trace};

use crate::book::OrderBook;
use crate::order::Order;
use crate::trade::{Trade, TradeLeg};
use crate::types::{OrderId, OrderType, Price, Quantity, Side};

const MAX_PRICE: Price = Price::MAX;
const MIN_PRICE: Price = 0;

impl OrderBook {
    /// Accept a new order, run matching, and return the trades produced.
    ///
    /// See SPEC_FULL.md §4.4 for the full per-type contract; this is a
    /// direct transcription.
    pub fn submit(&mut self, mut order: Order) -> Vec<Trade> {
        if self.contains(order.id()) {
            debug!(order_id = order.id(), "duplicate id; rejecting");
            return Vec::new();
        }

        if order.order_type() == OrderType::FillOrKill {
            let opposite = order.side().opposite();
            let available = self.achievable_quantity(opposite, order.price(), order.remaining_quantity());
            if available < order.remaining_quantity() {
                debug!(
                    order_id = order.id(),
                    available, requested = order.remaining_quantity(),
                    "fill-or-kill cannot be fully satisfied; rejecting without mutation"
                );
                return Vec::new();
            }
        }

        let is_market = order.order_type() == OrderType::Market;
        if is_market {
            let sentinel = match order.side() {
                Side::Bid => MAX_PRICE,
                Side::Ask => MIN_PRICE,
            };
            order
                .promote_to_limit(sentinel)
                .expect("order.order_type() == Market was just checked");
        }

        let id = order.id();
        let side = order.side();
        let price = order.price();
        let order_type = order.order_type();
        let cancel_residual = is_market || order_type == OrderType::FillAndKill;

        let handle = self.side_book_mut(side).level_mut_or_insert(price).push_back(order);
        self.register(id, side, price, order_type, handle);

        let trades = self.run_matching_loop();

        if cancel_residual && self.contains(id) {
            trace!(order_id = id, "discarding residual (market/fill-and-kill)");
            self.cancel(id);
        }

        trades
    }

    /// Cancel the resting order at `id` (if present) and resubmit a fresh
    /// order with the same id, side, and type at `(new_price, new_quantity)`.
    /// Time priority is lost: the new order joins its destination level's
    /// tail, even if that happens to be the same price.
    pub fn modify(&mut self, id: OrderId, new_price: Price, new_quantity: Quantity) -> Vec<Trade> {
        let Some(&(side, price, handle)) = self.index.get(&id) else {
            return Vec::new();
        };
        let order_type = self
            .side_book(side)
            .level(price)
            .and_then(|level| level.get(handle))
            .map(Order::order_type)
            .expect("index entry must reference a resting order");

        self.cancel(id);

        let replacement = match Order::new(id, new_price, side, order_type, new_quantity) {
            Ok(order) => order,
            Err(_) => return Vec::new(),
        };
        self.submit(replacement)
    }

    /// Whether both sides remain crossed at the current best prices.
    fn is_crossed(&self) -> bool {
        match (self.bids.best_price(), self.asks.best_price()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Repeatedly cross the book's best bid against its best ask until one
    /// side empties or the spread is no longer crossed.
    pub(crate) fn run_matching_loop(&mut self) -> Vec<Trade> {
        let mut trades = Vec::new();

        while self.is_crossed() {
            let bid_price = self.bids.best_price().expect("loop condition guarantees a best bid");
            let ask_price = self.asks.best_price().expect("loop condition guarantees a best ask");

            let (bid_id, bid_price_taken, ask_id, ask_price_taken, fill_qty, bid_emptied, ask_emptied) = {
                let bid_level = self
                    .bids
                    .level_mut(bid_price)
                    .expect("best bid price must have a level");
                let ask_level = self
                    .asks
                    .level_mut(ask_price)
                    .expect("best ask price must have a level");

                let bid_order = bid_level.front_mut().expect("non-empty level has a head order");
                let ask_order = ask_level.front_mut().expect("non-empty level has a head order");

                let fill_qty = bid_order.remaining_quantity().min(ask_order.remaining_quantity());
                bid_order.fill(fill_qty).expect("fill bounded by remaining_quantity by construction");
                ask_order.fill(fill_qty).expect("fill bounded by remaining_quantity by construction");

                (
                    bid_order.id(),
                    bid_order.price(),
                    ask_order.id(),
                    ask_order.price(),
                    fill_qty,
                    bid_order.is_filled(),
                    ask_order.is_filled(),
                )
            };

            trades.push(Trade {
                bid: TradeLeg {
                    order_id: bid_id,
                    price: bid_price_taken,
                    quantity: fill_qty,
                },
                ask: TradeLeg {
                    order_id: ask_id,
                    price: ask_price_taken,
                    quantity: fill_qty,
                },
                traded_at_millis: self.clock.now_millis(),
            });

            if bid_emptied {
                self.bids
                    .level_mut(bid_price)
                    .expect("level still present")
                    .pop_front();
                self.unregister(bid_id);
            }
            if ask_emptied {
                self.asks
                    .level_mut(ask_price)
                    .expect("level still present")
                    .pop_front();
                self.unregister(ask_id);
            }
            self.bids.drop_if_empty(bid_price);
            self.asks.drop_if_empty(ask_price);
        }

        trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderType;

    fn gtc(id: OrderId, side: Side, price: Price, qty: Quantity) -> Order {
        Order::new(id, price, side, OrderType::GoodTillCancel, qty).unwrap()
    }

    /// Scenario 1 (spec §8): equal bid/ask fully cross, book ends empty.
    #[test]
    fn scenario_equal_cross_empties_book() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Bid, 100, 10));
        let trades = book.submit(gtc(2, Side::Ask, 100, 10));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].bid.order_id, 1);
        assert_eq!(trades[0].ask.order_id, 2);
        assert_eq!(trades[0].quantity(), 10);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    /// Scenario 2: incoming ask sweeps two bid orders at the same price in
    /// FIFO order, leaving the later bid partially resting.
    #[test]
    fn scenario_fifo_sweep_leaves_remainder() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Bid, 100, 10));
        book.submit(gtc(2, Side::Bid, 100, 5));
        let trades = book.submit(gtc(3, Side::Ask, 100, 12));

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].bid.order_id, 1);
        assert_eq!(trades[0].quantity(), 10);
        assert_eq!(trades[1].bid.order_id, 2);
        assert_eq!(trades[1].quantity(), 2);

        assert_eq!(book.best_bid(), Some((100, 3)));
        assert!(book.best_ask().is_none());
    }

    /// Scenario 3: a FillAndKill bid sweeps two ask levels, any residual is
    /// discarded rather than left resting.
    #[test]
    fn scenario_fill_and_kill_discards_residual() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Ask, 101, 5));
        book.submit(gtc(2, Side::Ask, 102, 5));

        let fak = Order::new(3, 103, Side::Bid, OrderType::FillAndKill, 8).unwrap();
        let trades = book.submit(fak);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].ask.order_id, 1);
        assert_eq!(trades[0].quantity(), 5);
        assert_eq!(trades[1].ask.order_id, 2);
        assert_eq!(trades[1].quantity(), 3);

        assert_eq!(book.best_ask(), Some((102, 2)));
        assert!(!book.contains(3));
    }

    /// Scenario 4: a FillOrKill bid that cannot be fully satisfied is
    /// rejected without mutating the book at all.
    #[test]
    fn scenario_fill_or_kill_rejected_atomically() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Ask, 100, 5));
        book.submit(gtc(2, Side::Ask, 101, 5));

        let fok = Order::new(3, 101, Side::Bid, OrderType::FillOrKill, 11).unwrap();
        let trades = book.submit(fok);

        assert!(trades.is_empty());
        assert!(!book.contains(3));
        assert_eq!(book.best_ask(), Some((100, 5)));
        assert_eq!(book.snapshot_asks(2), vec![(100, 5), (101, 5)]);
    }

    /// Scenario 4b: the same FillOrKill, now exactly satisfiable, executes
    /// in full across both levels.
    #[test]
    fn fill_or_kill_executes_when_exactly_satisfiable() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Ask, 100, 5));
        book.submit(gtc(2, Side::Ask, 101, 5));

        let fok = Order::new(3, 101, Side::Bid, OrderType::FillOrKill, 10).unwrap();
        let trades = book.submit(fok);

        assert_eq!(trades.len(), 2);
        assert!(!book.contains(3));
        assert!(book.best_ask().is_none());
    }

    /// Scenario 5: cancel of a resting order empties the book; cancel of an
    /// unknown id is a silent no-op.
    #[test]
    fn scenario_cancel_known_and_unknown() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Bid, 100, 10));
        book.cancel(1);
        assert!(book.best_bid().is_none());
        assert!(!book.contains(1));

        book.cancel(99);
        assert!(book.best_bid().is_none());
    }

    /// Scenario 6: modify resets time priority — the modified order moves
    /// to the tail of its destination level even at an unchanged price.
    #[test]
    fn scenario_modify_resets_time_priority() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Bid, 100, 10));
        book.submit(gtc(2, Side::Bid, 100, 5));

        let trades = book.modify(1, 100, 10);
        assert!(trades.is_empty());

        let level_ids: Vec<OrderId> = book.bids.level(100).unwrap().iter().map(Order::id).collect();
        assert_eq!(level_ids, vec![2, 1]);
    }

    #[test]
    fn duplicate_submit_is_rejected_idempotently() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Bid, 100, 10));
        let trades = book.submit(gtc(1, Side::Bid, 100, 5));
        assert!(trades.is_empty());
        assert_eq!(book.best_bid(), Some((100, 10)));
    }

    #[test]
    fn market_order_never_rests_even_with_no_liquidity() {
        let mut book = OrderBook::new();
        let market = Order::new(1, 0, Side::Bid, OrderType::Market, 10).unwrap();
        let trades = book.submit(market);
        assert!(trades.is_empty());
        assert!(!book.contains(1));
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn market_order_crosses_multiple_levels_then_discards_residual() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Ask, 101, 4));
        book.submit(gtc(2, Side::Ask, 102, 4));

        let market = Order::new(3, 0, Side::Bid, OrderType::Market, 10).unwrap();
        let trades = book.submit(market);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades.iter().map(Trade::quantity).sum::<Quantity>(), 8);
        assert!(!book.contains(3));
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn good_for_day_ids_tracks_resting_orders_only() {
        let mut book = OrderBook::new();
        let gfd = Order::new(1, 100, Side::Bid, OrderType::GoodForDay, 10).unwrap();
        book.submit(gfd);
        assert_eq!(book.good_for_day_ids(), vec![1]);

        book.cancel(1);
        assert!(book.good_for_day_ids().is_empty());
    }

    #[test]
    fn price_crossing_invariant_holds_after_every_submit() {
        let mut book = OrderBook::new();
        book.submit(gtc(1, Side::Bid, 100, 3));
        book.submit(gtc(2, Side::Ask, 105, 3));
        book.submit(gtc(3, Side::Bid, 104, 3));

        match (book.best_bid(), book.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => assert!(bid < ask),
            _ => {}
        }
    }
}
