//! Event sink for engine operations.
//!
//! Every externally observable state change is reported through an
//! [`EngineListener`] before the engine call returns, in causal order.
//! Callbacks run while the engine holds exclusive access to the book, so a
//! listener must not call back into the engine.

use crate::order::{Order, OrderId, Price, Quantity, Side};

/// Passive sink for matching events. Every method is a no-op by default.
pub trait EngineListener {
    /// A trade executed at the resting order's price.
    fn on_trade(&mut self, taker_id: OrderId, maker_id: OrderId, price: Price, quantity: Quantity) {
        let _ = (taker_id, maker_id, price, quantity);
    }

    /// An order (or its unmatched remainder) was added to the book.
    fn on_added(&mut self, order: Order) {
        let _ = order;
    }

    /// A resting order was canceled.
    fn on_canceled(&mut self, id: OrderId) {
        let _ = id;
    }

    /// A resting order was reduced in place, keeping its queue position.
    /// Carries the updated order.
    fn on_modified(&mut self, order: Order) {
        let _ = order;
    }
}

/// Listener that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl EngineListener for NoopListener {}

/// Tagged form of the listener callbacks, for sinks that want one stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Trade {
        taker_id: OrderId,
        maker_id: OrderId,
        price: Price,
        quantity: Quantity,
    },
    Added {
        id: OrderId,
        price: Price,
        quantity: Quantity,
        side: Side,
    },
    Canceled {
        id: OrderId,
    },
    Modified {
        id: OrderId,
        price: Price,
        quantity: Quantity,
        side: Side,
    },
}

/// Listener that records events in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl EngineListener for EventLog {
    fn on_trade(&mut self, taker_id: OrderId, maker_id: OrderId, price: Price, quantity: Quantity) {
        self.events.push(Event::Trade {
            taker_id,
            maker_id,
            price,
            quantity,
        });
    }

    fn on_added(&mut self, order: Order) {
        self.events.push(Event::Added {
            id: order.id,
            price: order.price,
            quantity: order.quantity,
            side: order.side,
        });
    }

    fn on_canceled(&mut self, id: OrderId) {
        self.events.push(Event::Canceled { id });
    }

    fn on_modified(&mut self, order: Order) {
        self.events.push(Event::Modified {
            id: order.id,
            price: order.price,
            quantity: order.quantity,
            side: order.side,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_records_in_order() {
        let mut log = EventLog::new();
        log.on_trade(2, 1, 100, 50);
        log.on_added(Order::new(2, 10, 100, Side::Buy));
        log.on_canceled(2);

        assert_eq!(
            log.take(),
            vec![
                Event::Trade {
                    taker_id: 2,
                    maker_id: 1,
                    price: 100,
                    quantity: 50
                },
                Event::Added {
                    id: 2,
                    price: 100,
                    quantity: 10,
                    side: Side::Buy
                },
                Event::Canceled { id: 2 },
            ]
        );
        assert!(log.events.is_empty());
    }

    #[test]
    fn noop_listener_accepts_everything() {
        let mut noop = NoopListener;
        noop.on_trade(1, 2, 3, 4);
        noop.on_added(Order::new(1, 1, 1, Side::Sell));
        noop.on_canceled(1);
        noop.on_modified(Order::new(1, 1, 1, Side::Sell));
    }
}
