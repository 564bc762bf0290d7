//! Single-Flight Module
//!
//! Ensures at most one upstream fetch per cache key is in flight. Callers
//! arriving while a fetch runs wait for it and share its outcome.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::cache::CacheKey;
use crate::error::Result;
use crate::models::Record;

/// Outcome of one upstream fetch, shared by every caller of that flight.
pub type Outcome = Result<Arc<Vec<Record>>>;

type Slot = watch::Receiver<Option<Outcome>>;

// == Single Flight ==
/// Table of in-flight fetches keyed by cache key.
#[derive(Debug, Default)]
pub struct SingleFlight {
    flights: Mutex<HashMap<CacheKey, Slot>>,
}

/// Role of a caller for one key.
#[derive(Debug)]
pub enum Flight {
    /// The caller owns the fetch and must complete (or drop) the guard.
    Leader(FlightGuard),
    /// Another caller owns the fetch; wait for its outcome.
    Follower(FlightWaiter),
}

impl SingleFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // == Join ==
    /// Registers the caller as leader for `key`, or as follower if a fetch
    /// for `key` is already running.
    pub fn join(self: &Arc<Self>, key: &CacheKey) -> Flight {
        let mut flights = self.flights.lock();
        if let Some(slot) = flights.get(key) {
            return Flight::Follower(FlightWaiter { slot: slot.clone() });
        }

        let (tx, rx) = watch::channel(None);
        flights.insert(key.clone(), rx);
        Flight::Leader(FlightGuard {
            key: key.clone(),
            tx,
            table: Arc::clone(self),
        })
    }

    /// Number of keys with a fetch in flight.
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.flights.lock().contains_key(key)
    }
}

// == Flight Guard ==
/// Ownership of one key's fetch.
///
/// Dropping the guard clears the key from the table and wakes all waiters,
/// whether or not an outcome was published.
#[derive(Debug)]
pub struct FlightGuard {
    key: CacheKey,
    tx: watch::Sender<Option<Outcome>>,
    table: Arc<SingleFlight>,
}

impl FlightGuard {
    /// Publishes the outcome to all waiters and releases the key.
    pub fn complete(self, outcome: Outcome) {
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.table.flights.lock().remove(&self.key);
    }
}

// == Flight Waiter ==
/// Handle held by a caller waiting on another caller's fetch.
#[derive(Debug)]
pub struct FlightWaiter {
    slot: Slot,
}

impl FlightWaiter {
    /// Waits for the leader to finish.
    ///
    /// Returns None when the leader went away without publishing an outcome
    /// (cancelled or panicked); the caller should retry from the cache lookup.
    pub async fn wait(mut self) -> Option<Outcome> {
        loop {
            if let Some(outcome) = self.slot.borrow_and_update().clone() {
                return Some(outcome);
            }
            if self.slot.changed().await.is_err() {
                return self.slot.borrow().clone();
            }
        }
    }
}
