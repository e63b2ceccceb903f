//! # STOCKPILE Core
//!
//! A bounded-capacity shared stock for coordinating producer and
//! consumer threads with blocking backpressure in both directions.
//!
//! ## Design Principles
//!
//! 1. **One guarded counter** - a single `level` in `[0, capacity]`, the
//!    only shared mutable state in the crate
//! 2. **Batch transfers** - deposits and withdrawals move variable-sized
//!    amounts, not single units
//! 3. **Broadcast wake + re-check** - every level change wakes all
//!    waiters of the opposite kind; each re-validates its own predicate
//! 4. **No pacing, no I/O** - sleeps and logging setup live in the sim
//!    crate, never here
//!
//! ## Example
//!
//! ```rust
//! use stockpile::Stockpile;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let store = Arc::new(Stockpile::new(100)?);
//!
//! let supplier = {
//!     let store = Arc::clone(&store);
//!     thread::spawn(move || store.deposit(5))
//! };
//! supplier.join().unwrap()?;
//!
//! store.withdraw(3)?;
//! assert_eq!(store.level(), 2);
//! # Ok::<(), stockpile::StockError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod store;

pub use error::{StockError, StockResult};
pub use store::{StockStats, Stockpile};
