//! services/app/src/screens/mod.rs
//!
//! Per-screen controllers. Each binds the screen's focus lifecycle to gateway
//! calls through a `FocusQuery`, holds the transient form or selection state
//! the screen edits, and guards its mutating actions against double submits.
//! Rendering is left to whatever front end drives these controllers.

pub mod auth;
pub mod challenge_detail;
pub mod challenges;
pub mod guard;
pub mod home;
pub mod navigation;
pub mod profile;
pub mod query;
pub mod share_story;
pub mod stories;

pub use guard::ActionGuard;
pub use navigation::{initial_route, Route};
pub use query::{FocusQuery, QueryState};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Screen-local state is plain data, so a poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
