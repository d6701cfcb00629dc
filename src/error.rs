//! Engine error taxonomy.
//!
//! Every public engine operation either completes fully or fails with one of
//! these kinds before touching the book; a failed call emits no listener
//! events and commits no state change.

use thiserror::Error;

use crate::order::OrderId;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The node pool has no free slot for a resting order.
    ///
    /// In a production configuration this is a capacity-planning failure:
    /// the pool bounds the number of simultaneously resting orders and
    /// never grows.
    #[error("order pool exhausted")]
    PoolExhausted,

    /// Cancel or modify targeted an id that is not currently resting.
    #[error("order {0} is not in the book")]
    UnknownOrder(OrderId),

    /// Zero quantity, price outside the book's tick range, or an id that is
    /// already live.
    #[error("order {0} rejected by validation")]
    InvalidOrder(OrderId),
}
