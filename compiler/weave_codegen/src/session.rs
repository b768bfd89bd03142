//! One live session per thread.
//!
//! Builders are passed explicitly to every construct, so nothing reads this
//! state to find "the" builder. The flag only rejects a second live
//! [`ModuleBuilder`](crate::ModuleBuilder) on the same thread. Sessions on
//! other threads are unaffected.

use std::cell::Cell;
use std::marker::PhantomData;

use crate::error::{violation, UsageError};

thread_local! {
    static ACTIVE_SESSION: Cell<bool> = const { Cell::new(false) };
}

/// Whether a builder is alive on the current thread.
pub fn session_active() -> bool {
    ACTIVE_SESSION.with(Cell::get)
}

/// Holds the thread's session slot until dropped.
///
/// `!Send`: the slot belongs to the thread that claimed it.
#[derive(Debug)]
pub(crate) struct SessionGuard {
    _thread_bound: PhantomData<*const ()>,
}

impl SessionGuard {
    /// Claim the slot, panicking with [`UsageError::SessionActive`] if taken.
    #[track_caller]
    pub(crate) fn acquire() -> Self {
        if ACTIVE_SESSION.with(|active| active.replace(true)) {
            violation(UsageError::SessionActive);
        }
        tracing::trace!("session slot claimed");
        Self {
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        ACTIVE_SESSION.with(|active| active.set(false));
        tracing::trace!("session slot released");
    }
}
