//! # tickmatch
//!
//! A single-symbol, in-memory limit order book matching engine.
//!
//! ## Design principles
//!
//! - **Single-writer**: one thread owns the book exclusively; no locks,
//!   no suspension, no I/O anywhere in the core.
//! - **Price-time priority**: more aggressive prices match first, ties go
//!   to the earlier arrival; only the front of a level is ever filled.
//! - **Allocation-free steady state**: resting orders live in a pre-sized
//!   node arena, levels are intrusive linked lists through those nodes, and
//!   the id index reserves its capacity up front.
//! - **O(1) everywhere**: insert, cancel and per-fill work are all constant
//!   time; best-price cursors walk at most the distance the book moved.
//!
//! ## Architecture
//!
//! ```text
//! submit/cancel/modify --> [MatchingEngine] --> [EngineListener events]
//!                                |
//!                           [OrderBook]
//!                   bids/asks: Vec<Level> by tick
//!                   id index, node arena, cursors
//! ```
//!
//! [`spsc`] is a standalone ingress/egress ring buffer for wiring the engine
//! thread to the outside world; the core never depends on it.

pub mod arena;
pub mod book;
pub mod engine;
pub mod error;
pub mod level;
pub mod listener;
pub mod order;
pub mod spsc;

pub use arena::{Arena, NodeIndex, RestingOrder, NULL_INDEX};
pub use book::OrderBook;
pub use engine::MatchingEngine;
pub use error::EngineError;
pub use level::Level;
pub use listener::{EngineListener, Event, EventLog, NoopListener};
pub use order::{Order, OrderId, Price, Quantity, Side};
