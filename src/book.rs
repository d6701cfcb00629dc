//! The central limit order book.
//!
//! Both sides are dense arrays of price levels indexed by tick, with cached
//! best-price cursors: `max_bid` (0 when no bids) and `min_ask`
//! (`max_price + 1` when no asks). Dense indexing makes best-price
//! maintenance a short walk toward the spread instead of a map scan, which
//! is the right trade for instruments with a bounded tick range.
//!
//! The book owns the node arena and the id index; their lifetimes coincide.
//! All mutation goes through the insert/fill/remove primitives so the cursor,
//! index and level-sum invariants hold after every public engine call.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::arena::{Arena, NodeIndex, NULL_INDEX};
use crate::level::Level;
use crate::order::{Order, OrderId, Price, Quantity, Side};

pub struct OrderBook {
    pub(crate) arena: Arena,
    /// Live id -> arena node. Pre-reserved so it never rehashes below
    /// `capacity` resting orders.
    pub(crate) ids: FxHashMap<OrderId, NodeIndex>,

    pub(crate) bids: Vec<Level>,
    /// Highest price with a resting bid; 0 means no bids.
    pub(crate) max_bid: Price,

    pub(crate) asks: Vec<Level>,
    /// Lowest price with a resting ask; `max_price + 1` means no asks.
    pub(crate) min_ask: Price,

    pub(crate) max_price: Price,
}

impl OrderBook {
    /// Create a book for prices `1..=max_price` holding at most `capacity`
    /// simultaneously resting orders.
    pub fn new(capacity: usize, max_price: Price) -> Self {
        let levels = max_price as usize + 1;
        debug!(capacity, max_price, "order book created");
        Self {
            arena: Arena::new(capacity),
            ids: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            bids: vec![Level::new(); levels],
            max_bid: 0,
            asks: vec![Level::new(); levels],
            min_ask: max_price + 1,
            max_price,
        }
    }

    /// Pre-fault the arena pages before the first order arrives.
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    // ========================================================================
    // Best-price access
    // ========================================================================

    #[inline]
    pub fn has_bids(&self) -> bool {
        self.max_bid > 0
    }

    #[inline]
    pub fn has_asks(&self) -> bool {
        self.min_ask <= self.max_price
    }

    /// Highest resting bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.has_bids().then_some(self.max_bid)
    }

    /// Lowest resting ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.has_asks().then_some(self.min_ask)
    }

    /// `min_ask - max_bid` when both sides are populated.
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    // ========================================================================
    // Cursor maintenance
    // ========================================================================

    /// Walk `max_bid` down to the next non-empty bid level, or to the
    /// no-bids sentinel 0.
    #[inline]
    pub(crate) fn retreat_bid_cursor(&mut self) {
        while self.max_bid > 0 && self.bids[self.max_bid as usize].is_empty() {
            self.max_bid -= 1;
        }
    }

    /// Walk `min_ask` up to the next non-empty ask level, or to the
    /// no-asks sentinel `max_price + 1`.
    #[inline]
    pub(crate) fn advance_ask_cursor(&mut self) {
        while self.min_ask <= self.max_price && self.asks[self.min_ask as usize].is_empty() {
            self.min_ask += 1;
        }
    }

    // ========================================================================
    // Mutation primitives (called by the engine)
    // ========================================================================

    /// Write `order` into the pre-acquired `node` and link it as the newest
    /// order at its bid level.
    pub(crate) fn insert_bid(&mut self, node: NodeIndex, order: Order) {
        debug_assert!(order.price >= 1 && order.price <= self.max_price);
        self.arena.get_mut(node).order = order;
        self.bids[order.price as usize].push_back(&mut self.arena, node);
        self.ids.insert(order.id, node);
        if order.price > self.max_bid {
            self.max_bid = order.price;
        }
    }

    /// Mirror of [`OrderBook::insert_bid`] for the ask side.
    pub(crate) fn insert_ask(&mut self, node: NodeIndex, order: Order) {
        debug_assert!(order.price >= 1 && order.price <= self.max_price);
        self.arena.get_mut(node).order = order;
        self.asks[order.price as usize].push_back(&mut self.arena, node);
        self.ids.insert(order.id, node);
        if order.price < self.min_ask {
            self.min_ask = order.price;
        }
    }

    /// Fill `delta` of a resting bid. A fully-filled node is unlinked from
    /// the front of its level, released, and the bid cursor re-tightened.
    pub(crate) fn fill_bid(&mut self, node: NodeIndex, delta: Quantity) {
        let price = self.arena.get(node).order.price;
        self.bids[price as usize].reduce_quantity(delta);

        let n = self.arena.get_mut(node);
        debug_assert!(delta <= n.order.quantity);
        n.order.quantity -= delta;

        if n.order.quantity == 0 {
            debug_assert_eq!(self.bids[price as usize].front(), node);
            self.bids[price as usize].pop_front(&mut self.arena);
            self.clean(node);
            self.retreat_bid_cursor();
        }
    }

    /// Mirror of [`OrderBook::fill_bid`] for the ask side.
    pub(crate) fn fill_ask(&mut self, node: NodeIndex, delta: Quantity) {
        let price = self.arena.get(node).order.price;
        self.asks[price as usize].reduce_quantity(delta);

        let n = self.arena.get_mut(node);
        debug_assert!(delta <= n.order.quantity);
        n.order.quantity -= delta;

        if n.order.quantity == 0 {
            debug_assert_eq!(self.asks[price as usize].front(), node);
            self.asks[price as usize].pop_front(&mut self.arena);
            self.clean(node);
            self.advance_ask_cursor();
        }
    }

    /// Unlink a resting bid from anywhere in its level (cancel path) and
    /// release it. The level total drops by the node's remaining quantity.
    pub(crate) fn remove_bid(&mut self, node: NodeIndex) {
        let order = self.arena.get(node).order;
        self.bids[order.price as usize].reduce_quantity(order.quantity);
        self.bids[order.price as usize].remove(&mut self.arena, node);
        self.clean(node);
        self.retreat_bid_cursor();
    }

    /// Mirror of [`OrderBook::remove_bid`] for the ask side.
    pub(crate) fn remove_ask(&mut self, node: NodeIndex) {
        let order = self.arena.get(node).order;
        self.asks[order.price as usize].reduce_quantity(order.quantity);
        self.asks[order.price as usize].remove(&mut self.arena, node);
        self.clean(node);
        self.advance_ask_cursor();
    }

    /// Drop a node's id mapping and return its slot to the arena. The node
    /// must already be unlinked from its level.
    pub(crate) fn clean(&mut self, node: NodeIndex) {
        let id = self.arena.get(node).order.id;
        self.ids.remove(&id);
        self.arena.free(node);
    }

    /// Arena node of a live order. O(1) expected.
    #[inline]
    pub(crate) fn find(&self, id: OrderId) -> Option<NodeIndex> {
        self.ids.get(&id).copied()
    }

    // ========================================================================
    // Read-only queries
    // ========================================================================

    /// Copy of a live resting order.
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.find(id).map(|node| self.arena.get(node).order)
    }

    /// Total quantity and order count at one price level.
    pub fn depth(&self, side: Side, price: Price) -> (u64, u32) {
        let level = match side {
            Side::Buy => &self.bids[price as usize],
            Side::Sell => &self.asks[price as usize],
        };
        (level.total_quantity(), level.len())
    }

    /// Resting orders at one level in queue (time-priority) order.
    pub fn orders_at(&self, side: Side, price: Price) -> LevelOrders<'_> {
        let level = match side {
            Side::Buy => &self.bids[price as usize],
            Side::Sell => &self.asks[price as usize],
        };
        LevelOrders {
            arena: &self.arena,
            cursor: level.front(),
        }
    }

    /// Number of live resting orders.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Inclusive upper bound of the tick range.
    #[inline]
    pub fn max_price(&self) -> Price {
        self.max_price
    }

    /// Maximum number of simultaneously resting orders.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("orders", &self.ids.len())
            .field("capacity", &self.arena.capacity())
            .finish()
    }
}

/// Iterator over the resting orders of one level, oldest first.
pub struct LevelOrders<'a> {
    arena: &'a Arena,
    cursor: NodeIndex,
}

impl Iterator for LevelOrders<'_> {
    type Item = Order;

    fn next(&mut self) -> Option<Order> {
        if self.cursor == NULL_INDEX {
            return None;
        }
        let node = self.arena.get(self.cursor);
        self.cursor = node.next;
        Some(node.order)
    }
}
