//! Nonce manager for signed REST writes.
//!
//! Timestamps have millisecond resolution, so two legs signed in the same
//! millisecond would collide. Nonces here track the clock but are strictly
//! increasing, even across threads and clock regressions.

use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Timestamp and nonce headers for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStamp {
    pub timestamp: String,
    pub nonce: String,
}

/// Issues unique, monotonically increasing nonces.
#[derive(Debug)]
pub struct NonceManager<C: Clock> {
    /// Last issued nonce.
    counter: AtomicU64,
    clock: C,
}

impl<C: Clock> NonceManager<C> {
    /// Counter starts at the current time so nonces look like timestamps.
    #[must_use]
    pub fn new(clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            counter: AtomicU64::new(now.saturating_sub(1)),
            clock,
        }
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Returns `max(last + 1, now)`.
    ///
    /// Thread-safe via CAS loop.
    pub fn next(&self) -> u64 {
        let target = self.clock.now_ms();

        loop {
            let current = self.counter.load(Ordering::Acquire);
            let next_val = current.saturating_add(1).max(target);

            match self.counter.compare_exchange_weak(
                current,
                next_val,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next_val,
                Err(_) => continue,
            }
        }
    }

    /// Timestamp from the clock plus a nonce derived from it.
    pub fn stamp(&self) -> RequestStamp {
        let timestamp = self.clock.now_ms();
        let nonce = self.next();
        RequestStamp {
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
        }
    }
}

impl NonceManager<SystemClock> {
    /// Creates a new `NonceManager` with the system clock.
    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock)
    }
}

impl Default for NonceManager<SystemClock> {
    fn default() -> Self {
        Self::with_system_clock()
    }
}
