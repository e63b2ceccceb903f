//! # Bounded Quantity Store
//!
//! One guarded counter, one lock, two conditions.
//!
//! ```text
//! Supplier 1 ──┐                                  ┌── Customer 1
//! Supplier 2 ──┼──> deposit(n) ─┐    ┌─ withdraw(n) <─┼── Customer 2
//! Supplier N ──┘                │    │                └── Customer M
//!                        ┌──────▼────▼──────┐
//!                        │  Mutex { level } │  0 <= level <= capacity
//!                        │  not_full  (CV)  │  <- signaled on withdraw
//!                        │  not_empty (CV)  │  <- signaled on deposit
//!                        └──────────────────┘
//! ```
//!
//! Deposits block while the batch would overflow capacity; withdrawals
//! block while stock is short. Every level change wakes *all* waiters of
//! the opposite kind: amounts differ per waiter, so a single wake could
//! hand the change to a waiter it does not satisfy while starving one it
//! would. Each woken waiter re-checks its own predicate before touching
//! the counter.

use crate::error::{StockError, StockResult};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Lifetime counters for a [`Stockpile`].
///
/// Snapshot taken under the store's lock, so all fields are mutually
/// consistent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StockStats {
    /// Completed deposit operations.
    pub deposits: u64,
    /// Completed withdraw operations.
    pub withdrawals: u64,
    /// Total units added across all deposits.
    pub units_deposited: u64,
    /// Total units removed across all withdrawals.
    pub units_withdrawn: u64,
    /// Times a deposit went to sleep waiting for room.
    pub deposit_waits: u64,
    /// Times a withdraw went to sleep waiting for stock.
    pub withdraw_waits: u64,
    /// Highest level ever observed.
    pub peak_level: u32,
}

/// State protected by the store's lock.
struct StockState {
    /// Current quantity held, always in `[0, capacity]`.
    level: u32,
    /// Set by [`Stockpile::close`]; waiters observe it inside their
    /// re-check loop and bail out without mutating.
    closed: bool,
    /// Lifetime counters.
    stats: StockStats,
}

/// A bounded-capacity shared stock with blocking backpressure in both
/// directions.
///
/// Any number of threads may call [`deposit`](Stockpile::deposit) and
/// [`withdraw`](Stockpile::withdraw) concurrently. Each operation takes
/// the lock, sleeps on its condition until its full batch fits, commits
/// the batch atomically, then broadcasts to waiters of the opposite kind.
/// The level is never partially updated and never leaves `[0, capacity]`
/// at any point where the lock is not held.
pub struct Stockpile {
    /// Fixed upper bound on the level.
    capacity: u32,
    /// The single guarded counter plus the closed flag.
    state: Mutex<StockState>,
    /// Signaled (broadcast) whenever the level decreases.
    not_full: Condvar,
    /// Signaled (broadcast) whenever the level increases.
    not_empty: Condvar,
}

impl Stockpile {
    /// Creates a store with the given capacity and a level of zero.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: u32) -> StockResult<Self> {
        if capacity == 0 {
            return Err(StockError::ZeroCapacity);
        }

        Ok(Self {
            capacity,
            state: Mutex::new(StockState {
                level: 0,
                closed: false,
                stats: StockStats::default(),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns a snapshot of the current level.
    ///
    /// Consistent (taken under the lock) but possibly stale by the time
    /// the caller looks at it; diagnostic use only.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.state.lock().level
    }

    /// Returns a snapshot of the lifetime counters.
    #[must_use]
    pub fn stats(&self) -> StockStats {
        self.state.lock().stats
    }

    /// Returns true if [`close`](Stockpile::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Adds `amount` units, blocking while the batch would overflow
    /// capacity.
    ///
    /// A zero amount is a no-op that still takes the lock.
    ///
    /// # Errors
    ///
    /// - [`StockError::ExceedsCapacity`] if the batch could never fit,
    ///   rejected eagerly instead of blocking forever.
    /// - [`StockError::Closed`] if the store is closed before the batch
    ///   fits; the level is untouched.
    pub fn deposit(&self, amount: u32) -> StockResult<()> {
        self.check_fits(amount)?;

        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(StockError::Closed);
            }
            if amount <= self.capacity - state.level {
                break;
            }
            state.stats.deposit_waits += 1;
            tracing::trace!(amount, level = state.level, "deposit waiting for room");
            self.not_full.wait(&mut state);
        }

        self.commit_deposit(&mut state, amount);
        Ok(())
    }

    /// Removes `amount` units, blocking while stock is short.
    ///
    /// A zero amount is a no-op that still takes the lock.
    ///
    /// # Errors
    ///
    /// - [`StockError::ExceedsCapacity`] if the batch could never be
    ///   satisfied, rejected eagerly instead of blocking forever.
    /// - [`StockError::Closed`] if the store is closed before enough
    ///   stock accrues; the level is untouched.
    pub fn withdraw(&self, amount: u32) -> StockResult<()> {
        self.check_fits(amount)?;

        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(StockError::Closed);
            }
            if amount <= state.level {
                break;
            }
            state.stats.withdraw_waits += 1;
            tracing::trace!(amount, level = state.level, "withdraw waiting for stock");
            self.not_empty.wait(&mut state);
        }

        self.commit_withdraw(&mut state, amount);
        Ok(())
    }

    /// [`deposit`](Stockpile::deposit) with a bounded wait.
    ///
    /// # Errors
    ///
    /// [`StockError::WaitTimeout`] if the batch does not fit within
    /// `timeout`; the level is untouched. Otherwise as `deposit`.
    pub fn deposit_timeout(&self, amount: u32, timeout: Duration) -> StockResult<()> {
        self.check_fits(amount)?;
        let deadline = Instant::now() + timeout;

        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(StockError::Closed);
            }
            if amount <= self.capacity - state.level {
                break;
            }
            if Instant::now() >= deadline {
                return Err(StockError::WaitTimeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            state.stats.deposit_waits += 1;
            let _ = self.not_full.wait_until(&mut state, deadline);
        }

        self.commit_deposit(&mut state, amount);
        Ok(())
    }

    /// [`withdraw`](Stockpile::withdraw) with a bounded wait.
    ///
    /// # Errors
    ///
    /// [`StockError::WaitTimeout`] if stock does not accrue within
    /// `timeout`; the level is untouched. Otherwise as `withdraw`.
    pub fn withdraw_timeout(&self, amount: u32, timeout: Duration) -> StockResult<()> {
        self.check_fits(amount)?;
        let deadline = Instant::now() + timeout;

        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(StockError::Closed);
            }
            if amount <= state.level {
                break;
            }
            if Instant::now() >= deadline {
                return Err(StockError::WaitTimeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            state.stats.withdraw_waits += 1;
            let _ = self.not_empty.wait_until(&mut state, deadline);
        }

        self.commit_withdraw(&mut state, amount);
        Ok(())
    }

    /// Non-blocking deposit.
    ///
    /// # Errors
    ///
    /// [`StockError::InsufficientRoom`] if the batch does not fit right
    /// now. Otherwise as [`deposit`](Stockpile::deposit).
    pub fn try_deposit(&self, amount: u32) -> StockResult<()> {
        self.check_fits(amount)?;

        let mut state = self.state.lock();
        if state.closed {
            return Err(StockError::Closed);
        }
        if amount > self.capacity - state.level {
            return Err(StockError::InsufficientRoom {
                capacity: self.capacity,
                level: state.level,
                amount,
            });
        }

        self.commit_deposit(&mut state, amount);
        Ok(())
    }

    /// Non-blocking withdraw.
    ///
    /// # Errors
    ///
    /// [`StockError::InsufficientStock`] if stock is short right now.
    /// Otherwise as [`withdraw`](Stockpile::withdraw).
    pub fn try_withdraw(&self, amount: u32) -> StockResult<()> {
        self.check_fits(amount)?;

        let mut state = self.state.lock();
        if state.closed {
            return Err(StockError::Closed);
        }
        if amount > state.level {
            return Err(StockError::InsufficientStock {
                level: state.level,
                amount,
            });
        }

        self.commit_withdraw(&mut state, amount);
        Ok(())
    }

    /// Closes the store, waking every blocked waiter.
    ///
    /// Blocked and subsequent operations return [`StockError::Closed`]
    /// without mutating the level. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        tracing::debug!(level = state.level, "stockpile closed");
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Rejects amounts that no wait could ever satisfy.
    fn check_fits(&self, amount: u32) -> StockResult<()> {
        if amount > self.capacity {
            return Err(StockError::ExceedsCapacity {
                capacity: self.capacity,
                amount,
            });
        }
        Ok(())
    }

    /// Applies a deposit and broadcasts to withdrawers.
    ///
    /// Caller has already established `level + amount <= capacity`.
    fn commit_deposit(&self, state: &mut StockState, amount: u32) {
        state.level += amount;
        state.stats.deposits += 1;
        state.stats.units_deposited += u64::from(amount);
        state.stats.peak_level = state.stats.peak_level.max(state.level);
        tracing::trace!(amount, level = state.level, "deposit committed");
        // Broadcast: the new batch may satisfy several waiting
        // withdrawals of different sizes.
        self.not_empty.notify_all();
    }

    /// Applies a withdraw and broadcasts to depositors.
    ///
    /// Caller has already established `amount <= level`.
    fn commit_withdraw(&self, state: &mut StockState, amount: u32) {
        state.level -= amount;
        state.stats.withdrawals += 1;
        state.stats.units_withdrawn += u64::from(amount);
        tracing::trace!(amount, level = state.level, "withdraw committed");
        self.not_full.notify_all();
    }
}
