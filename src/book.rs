//! The two-sided book: one [`SideBook`] per side plus the [`OrderIndex`] that
//! lets `cancel`/`modify` reach a resting order in O(1), both to find its
//! level and to splice it back out of that level's queue.
//!
//! Grounded on the teacher's `OrderBook` (`bids`/`asks` as
//! `BTreeMap<u64, VecDeque<Order>>` plus its `EitherIter` direction-erasing
//! iterator); the index is new, added because the teacher's `cancel_order`
//! does a full linear scan of both sides (see DESIGN.md). The handle the
//! index stores alongside `(side, price)` is what makes the removal itself
//! O(1) too, rather than merely locating which level to scan.

use std::collections::btree_map::Iter as BTreeIter;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::iter::Rev;

use crate::clock::{Clock, SystemClock};
use crate::price_level::{Handle, PriceLevel};
use crate::types::{OrderId, OrderType, Price, Quantity, Side};

/// Unifies ascending and descending `BTreeMap` iteration, mirroring the
/// teacher's `EitherIter`: bids must be walked from the highest price down,
/// asks from the lowest price up, and both sides share this module's
/// snapshot/best-price logic.
enum LevelIter<'a> {
    Asc(BTreeIter<'a, Price, PriceLevel>),
    Desc(Rev<BTreeIter<'a, Price, PriceLevel>>),
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = (&'a Price, &'a PriceLevel);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            LevelIter::Asc(iter) => iter.next(),
            LevelIter::Desc(iter) => iter.next(),
        }
    }
}

/// One side of the book: a sorted `price -> PriceLevel` map, walked in the
/// direction that yields "best price first" for that side.
pub(crate) struct SideBook {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl SideBook {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// The best (highest bid / lowest ask) price currently resting, if any.
    pub(crate) fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Bid => self.levels.keys().next_back().copied(),
            Side::Ask => self.levels.keys().next().copied(),
        }
    }

    pub(crate) fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub(crate) fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Get-or-create the level at `price`, for appending a new resting order.
    pub(crate) fn level_mut_or_insert(&mut self, price: Price) -> &mut PriceLevel {
        self.levels.entry(price).or_insert_with(PriceLevel::new)
    }

    /// Drop the level at `price` if it has become empty. Must be called
    /// after every removal from a level; the spec forbids empty levels from
    /// existing in a SideBook.
    pub(crate) fn drop_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels in best-to-worst order, for snapshotting.
    fn iter_from_best(&self) -> LevelIter<'_> {
        match self.side {
            Side::Bid => LevelIter::Desc(self.levels.iter().rev()),
            Side::Ask => LevelIter::Asc(self.levels.iter()),
        }
    }

    /// Up to `n` `(price, total_remaining_quantity)` pairs, best price first.
    pub(crate) fn snapshot(&self, n: usize) -> Vec<(Price, Quantity)> {
        self.iter_from_best()
            .take(n)
            .map(|(&price, level)| (price, level.total_quantity()))
            .collect()
    }

    /// Cumulative remaining quantity available at prices at least as good as
    /// `limit_price` (bids: `>= limit_price`; asks: `<= limit_price`), capped
    /// at `cap` once reached — used by the `FillOrKill` pre-check, which
    /// only needs to know "is there enough", not the exact total.
    pub(crate) fn achievable_quantity(&self, limit_price: Price, cap: Quantity) -> Quantity {
        let mut total: Quantity = 0;
        for (&price, level) in self.iter_from_best() {
            let acceptable = match self.side {
                Side::Bid => price >= limit_price,
                Side::Ask => price <= limit_price,
            };
            if !acceptable {
                break;
            }
            total += level.total_quantity();
            if total >= cap {
                return total;
            }
        }
        total
    }
}

/// `order_id -> (side, price, handle)`: `side`/`price` find the `PriceLevel`
/// a resting order belongs to in O(1); `handle` then splices it out of that
/// level's linked list in O(1) too (see [`PriceLevel::remove`]), satisfying
/// spec.md §4.2's "remove-at-handle (O(1))" directly rather than settling
/// for level-local scan.
pub(crate) type OrderIndex = HashMap<OrderId, (Side, Price, Handle)>;

/// The matching core: two [`SideBook`]s, an [`OrderIndex`], and the set of
/// currently-resting `GoodForDay` ids (maintained incrementally so the
/// session controller's end-of-day sweep never has to scan the book).
pub struct OrderBook {
    pub(crate) bids: SideBook,
    pub(crate) asks: SideBook,
    pub(crate) index: OrderIndex,
    pub(crate) good_for_day: HashSet<OrderId>,
    pub(crate) clock: Box<dyn Clock>,
}

impl OrderBook {
    /// A new, empty book timestamped by the real system clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// A new, empty book timestamped by a caller-supplied [`Clock`] —
    /// the seam a test double (`FixedClock`) plugs into.
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            bids: SideBook::new(Side::Bid),
            asks: SideBook::new(Side::Ask),
            index: OrderIndex::new(),
            good_for_day: HashSet::new(),
            clock,
        }
    }

    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        let price = self.bids.best_price()?;
        Some((price, self.bids.level(price)?.total_quantity()))
    }

    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        let price = self.asks.best_price()?;
        Some((price, self.asks.level(price)?.total_quantity()))
    }

    pub fn snapshot_bids(&self, n: usize) -> Vec<(Price, Quantity)> {
        self.bids.snapshot(n)
    }

    pub fn snapshot_asks(&self, n: usize) -> Vec<(Price, Quantity)> {
        self.asks.snapshot(n)
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    /// Ids of all currently-resting `GoodForDay` orders, for a session
    /// controller to sweep at end of day (SPEC_FULL.md §10.5).
    pub fn good_for_day_ids(&self) -> Vec<OrderId> {
        self.good_for_day.iter().copied().collect()
    }

    pub(crate) fn side_book(&self, side: Side) -> &SideBook {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    pub(crate) fn side_book_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Remove a resting order by id: splice it out of its level in O(1) via
    /// its stored handle, erase the index entry, and drop the level if it's
    /// now empty. A no-op, not an error, if the id is unknown.
    pub fn cancel(&mut self, id: OrderId) {
        let Some((side, price, handle)) = self.index.remove(&id) else {
            return;
        };
        self.good_for_day.remove(&id);
        let book_side = self.side_book_mut(side);
        if let Some(level) = book_side.level_mut(price) {
            if let Some(mut order) = level.remove(handle) {
                order.cancel();
            }
        }
        book_side.drop_if_empty(price);
    }

    /// Record a freshly-inserted order's location (`side`, `price`, and the
    /// `handle` its level just returned from `push_back`), so later
    /// `cancel`/`modify` calls never have to scan either side of the book.
    pub(crate) fn register(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        order_type: OrderType,
        handle: Handle,
    ) {
        self.index.insert(id, (side, price, handle));
        if order_type == OrderType::GoodForDay {
            self.good_for_day.insert(id);
        }
    }

    pub(crate) fn unregister(&mut self, id: OrderId) {
        self.index.remove(&id);
        self.good_for_day.remove(&id);
    }

    pub(crate) fn achievable_quantity(&self, side: Side, limit_price: Price, cap: Quantity) -> Quantity {
        self.side_book(side).achievable_quantity(limit_price, cap)
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
