//! # Timer Persistence
//!
//! The persisted `Timer` record and the `TimerStore` trait the rest of the
//! crate talks to. The store is the sole source of truth: every mutation is a
//! read-modify-write against it, never an in-place object mutation.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: DashMap-backed in-memory store for tests and embedders
//! - 1.1.0: Partial updates via TimerPatch (snooze-count increment included)
//! - 1.0.0: Initial sqlite-backed store

pub mod memory;
pub mod sqlite;

use crate::core::TimerError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use self::memory::MemoryTimerStore;
pub use self::sqlite::SqliteTimerStore;

/// A user-created reminder timer. The sole persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Short human-typeable id, unique among live timers, immutable.
    pub id: String,
    /// Reminder text shown on delivery.
    pub message: String,
    /// Opaque user id of the timer's creator. Immutable.
    pub owner: String,
    /// Opaque channel id the timer was created in. Immutable; delivery falls
    /// back to a DM with the owner when this cannot be resolved.
    pub channel: String,
    /// First-ever due time, kept as a historical record. Immutable.
    pub original_due: DateTime<Utc>,
    /// Due time used for scheduling. Moved by snooze and edit.
    pub effective_due: DateTime<Utc>,
    /// Creation instant. Immutable.
    pub created_at: DateTime<Utc>,
    /// Number of snoozes so far. Never decremented.
    pub snooze_count: u32,
    /// False until the due notification has been sent; snooze resets it so the
    /// timer can fire again.
    pub delivered: bool,
}

/// Partial update applied by [`TimerStore::update`]. Unset fields are left
/// untouched; `increment_snooze` bumps the counter atomically in the store.
#[derive(Debug, Clone, Default)]
pub struct TimerPatch {
    pub message: Option<String>,
    pub effective_due: Option<DateTime<Utc>>,
    pub delivered: Option<bool>,
    pub increment_snooze: bool,
}

impl TimerPatch {
    /// Patch that marks a timer as delivered.
    pub fn delivered() -> Self {
        TimerPatch {
            delivered: Some(true),
            ..TimerPatch::default()
        }
    }

    /// Patch applied by a snooze: new due time, counter bump, delivery reset.
    pub fn snooze(new_due: DateTime<Utc>) -> Self {
        TimerPatch {
            effective_due: Some(new_due),
            delivered: Some(false),
            increment_snooze: true,
            ..TimerPatch::default()
        }
    }

    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.effective_due.is_none()
            && self.delivered.is_none()
            && !self.increment_snooze
    }
}

/// Key-indexed persistence for timers, exposing exactly the filtered scans the
/// lifecycle service and scheduler need.
#[async_trait]
pub trait TimerStore: Send + Sync {
    /// Insert a new record. A duplicate id is a store error, upholding id
    /// uniqueness even under concurrent creation.
    async fn create(&self, timer: &Timer) -> Result<(), TimerError>;

    /// Look a timer up by id.
    async fn find_unique(&self, id: &str) -> Result<Option<Timer>, TimerError>;

    /// All timers belonging to `owner`; with `only_active`, only undelivered
    /// ones.
    async fn find_for_owner(&self, owner: &str, only_active: bool)
        -> Result<Vec<Timer>, TimerError>;

    /// All timers with `effective_due <= now` that have not been delivered.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Timer>, TimerError>;

    /// Apply a partial update and return the updated record. `NotFound` if the
    /// record no longer exists.
    async fn update(&self, id: &str, patch: TimerPatch) -> Result<Timer, TimerError>;

    /// Remove a record. `NotFound` if it no longer exists.
    async fn delete(&self, id: &str) -> Result<(), TimerError>;
}

/// Apply a patch to an owned record. Shared by the store implementations so
/// both agree on the exact semantics of a partial update.
pub(crate) fn apply_patch(timer: &mut Timer, patch: &TimerPatch) {
    if let Some(message) = &patch.message {
        timer.message = message.clone();
    }
    if let Some(effective_due) = patch.effective_due {
        timer.effective_due = effective_due;
    }
    if let Some(delivered) = patch.delivered {
        timer.delivered = delivered;
    }
    if patch.increment_snooze {
        timer.snooze_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_timer() -> Timer {
        let due = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        Timer {
            id: "abcd".to_string(),
            message: "stand-up".to_string(),
            owner: "1001".to_string(),
            channel: "2002".to_string(),
            original_due: due,
            effective_due: due,
            created_at: Utc.with_ymd_and_hms(2025, 2, 28, 9, 0, 0).unwrap(),
            snooze_count: 0,
            delivered: false,
        }
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut timer = sample_timer();
        let before = timer.clone();
        apply_patch(&mut timer, &TimerPatch::default());
        assert_eq!(timer, before);
        assert!(TimerPatch::default().is_empty());
    }

    #[test]
    fn test_snooze_patch_semantics() {
        let mut timer = sample_timer();
        timer.delivered = true;
        let new_due = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();

        apply_patch(&mut timer, &TimerPatch::snooze(new_due));

        assert_eq!(timer.effective_due, new_due);
        assert_eq!(timer.snooze_count, 1);
        assert!(!timer.delivered);
        // Historical record survives the snooze
        assert_eq!(
            timer.original_due,
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_delivered_patch_only_flips_the_flag() {
        let mut timer = sample_timer();
        let before = timer.clone();
        apply_patch(&mut timer, &TimerPatch::delivered());
        assert!(timer.delivered);
        assert_eq!(timer.message, before.message);
        assert_eq!(timer.effective_due, before.effective_due);
        assert_eq!(timer.snooze_count, before.snooze_count);
    }
}
