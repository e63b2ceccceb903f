//! # Stockpile Error Types
//!
//! All errors that can occur while coordinating the shared stock.

use thiserror::Error;

/// Errors that can occur while operating on a [`crate::Stockpile`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockError {
    /// Construction with a capacity of zero.
    #[error("capacity must be positive")]
    ZeroCapacity,

    /// The requested amount can never fit, no matter how long we wait.
    #[error("amount {amount} exceeds capacity {capacity}, would block forever")]
    ExceedsCapacity {
        /// Fixed upper bound of the store.
        capacity: u32,
        /// The amount that was requested.
        amount: u32,
    },

    /// Non-blocking deposit found insufficient free room.
    #[error("insufficient room: capacity {capacity}, level {level}, tried to add {amount}")]
    InsufficientRoom {
        /// Fixed upper bound of the store.
        capacity: u32,
        /// Level at the time of the attempt.
        level: u32,
        /// The amount that was requested.
        amount: u32,
    },

    /// Non-blocking withdraw found insufficient stock.
    #[error("insufficient stock: level {level}, tried to remove {amount}")]
    InsufficientStock {
        /// Level at the time of the attempt.
        level: u32,
        /// The amount that was requested.
        amount: u32,
    },

    /// A bounded wait expired before the predicate was satisfied.
    #[error("wait timed out after {waited_ms} ms")]
    WaitTimeout {
        /// The budget that was exhausted, in milliseconds.
        waited_ms: u64,
    },

    /// The store was closed while (or before) waiting.
    #[error("stockpile closed")]
    Closed,
}

/// Result type for stockpile operations.
pub type StockResult<T> = Result<T, StockError>;
