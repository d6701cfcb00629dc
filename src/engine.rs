//! Order matching: submit, cancel, modify.
//!
//! The engine is a stateless façade over a [`OrderBook`]; it holds no data
//! of its own, so one book plus any listener is a complete matching setup.
//!
//! The two sides differ only in comparator direction and which cursor moves,
//! so the matching loop is written once and parameterized by a side policy.
//! Each public operation dispatches on the order's side exactly once; the
//! loop body is side-agnostic.
//!
//! Operations are atomic: every precondition is checked before the first
//! state mutation or listener call, so a failed call is a strict no-op.

use tracing::warn;

use crate::arena::NodeIndex;
use crate::book::OrderBook;
use crate::error::EngineError;
use crate::listener::EngineListener;
use crate::order::{Order, OrderId, Price, Quantity, Side};

/// What the side-agnostic matching loop needs from a side.
///
/// `BuySide` aggresses into asks and rests among bids; `SellSide` mirrors.
trait SidePolicy {
    /// Any liquidity on the opposite side?
    fn has_opposite(book: &OrderBook) -> bool;

    /// Does `order` cross the best opposite price? The cursor sentinels make
    /// this safe to evaluate on an empty side (it is then always false for
    /// in-range prices).
    fn crosses(book: &OrderBook, order: &Order) -> bool;

    /// Front node of the best opposite level. Callers check
    /// [`SidePolicy::has_opposite`] first.
    fn best_opposite_front(book: &OrderBook) -> NodeIndex;

    /// Fill `delta` of an opposite-side resting order (the matching path).
    fn fill_opposite(book: &mut OrderBook, node: NodeIndex, delta: Quantity);

    /// Fill `delta` of a same-side resting order (the in-place modify path).
    fn fill_resting(book: &mut OrderBook, node: NodeIndex, delta: Quantity);

    /// Rest `order` on this side in the pre-acquired `node`.
    fn insert(book: &mut OrderBook, node: NodeIndex, order: Order);

    /// Unlink and release a same-side resting order (the cancel path).
    fn remove(book: &mut OrderBook, node: NodeIndex);
}

struct BuySide;

impl SidePolicy for BuySide {
    #[inline]
    fn has_opposite(book: &OrderBook) -> bool {
        book.has_asks()
    }

    #[inline]
    fn crosses(book: &OrderBook, order: &Order) -> bool {
        order.price >= book.min_ask
    }

    #[inline]
    fn best_opposite_front(book: &OrderBook) -> NodeIndex {
        book.asks[book.min_ask as usize].front()
    }

    #[inline]
    fn fill_opposite(book: &mut OrderBook, node: NodeIndex, delta: Quantity) {
        book.fill_ask(node, delta);
    }

    #[inline]
    fn fill_resting(book: &mut OrderBook, node: NodeIndex, delta: Quantity) {
        book.fill_bid(node, delta);
    }

    #[inline]
    fn insert(book: &mut OrderBook, node: NodeIndex, order: Order) {
        book.insert_bid(node, order);
    }

    #[inline]
    fn remove(book: &mut OrderBook, node: NodeIndex) {
        book.remove_bid(node);
    }
}

struct SellSide;

impl SidePolicy for SellSide {
    #[inline]
    fn has_opposite(book: &OrderBook) -> bool {
        book.has_bids()
    }

    #[inline]
    fn crosses(book: &OrderBook, order: &Order) -> bool {
        order.price <= book.max_bid
    }

    #[inline]
    fn best_opposite_front(book: &OrderBook) -> NodeIndex {
        book.bids[book.max_bid as usize].front()
    }

    #[inline]
    fn fill_opposite(book: &mut OrderBook, node: NodeIndex, delta: Quantity) {
        book.fill_bid(node, delta);
    }

    #[inline]
    fn fill_resting(book: &mut OrderBook, node: NodeIndex, delta: Quantity) {
        book.fill_ask(node, delta);
    }

    #[inline]
    fn insert(book: &mut OrderBook, node: NodeIndex, order: Order) {
        book.insert_ask(node, order);
    }

    #[inline]
    fn remove(book: &mut OrderBook, node: NodeIndex) {
        book.remove_ask(node);
    }
}

/// Stateless matching engine over a [`OrderBook`].
pub struct MatchingEngine;

impl MatchingEngine {
    /// Match `order` against the opposite side, resting any remainder.
    ///
    /// Emits zero or more `on_trade` events (at the resting orders' prices,
    /// oldest order first within a level), then exactly one `on_added` iff
    /// residual quantity rests.
    ///
    /// # Errors
    /// `InvalidOrder` for zero quantity, out-of-range price, or a live id;
    /// `PoolExhausted` when no node slot is free. Both are checked before
    /// any matching, so a rejected order trades nothing.
    pub fn submit<L: EngineListener>(
        book: &mut OrderBook,
        order: Order,
        listener: &mut L,
    ) -> Result<(), EngineError> {
        if order.quantity == 0 || order.price < 1 || order.price > book.max_price {
            return Err(EngineError::InvalidOrder(order.id));
        }
        if book.find(order.id).is_some() {
            return Err(EngineError::InvalidOrder(order.id));
        }

        // Acquire the rest slot up front: a full pool rejects the order
        // before any trade happens, and a fully-matched order just returns
        // the slot. Free-list order is the only difference either way.
        let node = match book.arena.alloc() {
            Some(node) => node,
            None => {
                warn!(order_id = order.id, "order pool exhausted");
                return Err(EngineError::PoolExhausted);
            }
        };

        match order.side {
            Side::Buy => Self::match_order::<BuySide, L>(book, order, node, listener),
            Side::Sell => Self::match_order::<SellSide, L>(book, order, node, listener),
        }
        Ok(())
    }

    /// Cancel the resting order `id`. Emits exactly one `on_canceled`.
    ///
    /// # Errors
    /// `UnknownOrder` when `id` is not live.
    pub fn cancel<L: EngineListener>(
        book: &mut OrderBook,
        id: OrderId,
        listener: &mut L,
    ) -> Result<(), EngineError> {
        let node = book.find(id).ok_or(EngineError::UnknownOrder(id))?;
        match book.arena.get(node).order.side {
            Side::Buy => BuySide::remove(book, node),
            Side::Sell => SellSide::remove(book, node),
        }
        listener.on_canceled(id);
        Ok(())
    }

    /// Amend the resting order `id` to `price`/`quantity`.
    ///
    /// A pure size reduction at the same price is applied in place and keeps
    /// the order's queue position, emitting exactly one `on_modified`. Any
    /// other change is a cancel-plus-resubmit under the same id: the
    /// replacement runs the full matching loop against the post-cancel book
    /// (so it can trade), and time priority is lost. That branch emits the
    /// resubmission's events only — no `on_canceled`, no `on_modified`.
    ///
    /// # Errors
    /// `UnknownOrder` when `id` is not live; `InvalidOrder` for zero
    /// quantity or out-of-range price.
    pub fn modify<L: EngineListener>(
        book: &mut OrderBook,
        id: OrderId,
        price: Price,
        quantity: Quantity,
        listener: &mut L,
    ) -> Result<(), EngineError> {
        if quantity == 0 || price < 1 || price > book.max_price {
            return Err(EngineError::InvalidOrder(id));
        }
        let node = book.find(id).ok_or(EngineError::UnknownOrder(id))?;
        let current = book.arena.get(node).order;

        if price == current.price && quantity < current.quantity {
            // Less aggressive at the same price: shrink in place, keep
            // queue position. quantity >= 1, so the node stays linked.
            let delta = current.quantity - quantity;
            match current.side {
                Side::Buy => BuySide::fill_resting(book, node, delta),
                Side::Sell => SellSide::fill_resting(book, node, delta),
            }
            listener.on_modified(book.arena.get(node).order);
            Ok(())
        } else {
            let replacement = Order::new(id, quantity, price, current.side);
            match current.side {
                Side::Buy => BuySide::remove(book, node),
                Side::Sell => SellSide::remove(book, node),
            }
            // The remove above freed a slot, so this cannot fail.
            let node = book.arena.alloc().ok_or(EngineError::PoolExhausted)?;
            match replacement.side {
                Side::Buy => Self::match_order::<BuySide, L>(book, replacement, node, listener),
                Side::Sell => Self::match_order::<SellSide, L>(book, replacement, node, listener),
            }
            Ok(())
        }
    }

    /// The side-agnostic matching loop.
    ///
    /// Each iteration either exhausts the incoming order or fully fills the
    /// front of the best opposite level, so it terminates. Only the front of
    /// a level is ever filled; partial fills keep their queue position.
    fn match_order<P: SidePolicy, L: EngineListener>(
        book: &mut OrderBook,
        mut order: Order,
        node: NodeIndex,
        listener: &mut L,
    ) {
        while order.quantity > 0 && P::has_opposite(book) && P::crosses(book, &order) {
            let resting = P::best_opposite_front(book);
            let maker = book.arena.get(resting).order;

            let traded = order.quantity.min(maker.quantity);
            order.quantity -= traded;
            P::fill_opposite(book, resting, traded);

            // Trades print at the resting order's price.
            listener.on_trade(order.id, maker.id, maker.price, traded);
        }

        if order.quantity > 0 {
            P::insert(book, node, order);
            listener.on_added(order);
        } else {
            book.arena.free(node);
        }
    }
}
