//! Session Context
//!
//! State every component of one session shares: the error slot, the
//! liveness flag checked by late completions, and the lock helpers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::ErrorSlot;

#[derive(Debug, Clone)]
pub struct SessionContext {
    errors: ErrorSlot,
    active: Arc<AtomicBool>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            errors: ErrorSlot::new(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn errors(&self) -> &ErrorSlot {
        &self.errors
    }

    /// False once the session has been torn down
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark the session ended. Returns true only for the first call.
    pub fn end(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }
}

/// Monotonic ticket source used to drop completions of superseded requests
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: Arc<AtomicU64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a newly issued request
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True if no request was issued after `ticket`
    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

// Locks are never held across an await, so a poisoned lock only means a
// panic elsewhere mid-write; the value is still the last complete state.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
