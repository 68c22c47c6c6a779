//! crates/empathy_core/src/progress.rs
//!
//! Challenge progress arithmetic. Steps are equally weighted.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::domain::ChallengeStep;

pub const COMPLETE: u8 = 100;

/// `round(completed * 100 / total)`, half rounding up. A challenge without
/// steps has no progress; completing every step yields exactly 100.
pub fn compute_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed * 100 + total / 2) / total) as u8
}

/// Progress for the checked steps, ignoring numbers that are not steps of
/// this challenge.
pub fn progress_for_steps(steps: &[ChallengeStep], checked: &BTreeSet<u32>) -> u8 {
    let completed = steps.iter().filter(|s| checked.contains(&s.step_no)).count();
    compute_progress(completed, steps.len())
}

pub fn is_complete(progress: u8) -> bool {
    progress >= COMPLETE
}

/// Reconstructs a checked set from a bare percentage by marking the first
/// steps in order. Used when the backend reports progress without the set.
pub fn steps_from_progress(steps: &[ChallengeStep], progress: u8) -> BTreeSet<u32> {
    let total = steps.len();
    let completed = (usize::from(progress.min(COMPLETE)) * total + 50) / 100;
    steps.iter().take(completed).map(|s| s.step_no).collect()
}

/// Whole days since `start`, rounded up and never negative.
pub fn days_elapsed(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    (millis + DAY_MS - 1) / DAY_MS
}
