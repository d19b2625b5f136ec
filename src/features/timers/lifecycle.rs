//! Timer lifecycle operations: create, list, get, delete, snooze, edit.
//!
//! Every mutation is a read-modify-write against the store; the store is the
//! sole source of truth. Ownership checks (requesting user == owner) belong to
//! the command front-end, not here.

use super::id::random_id;
use crate::core::{Clock, TimerError};
use crate::database::{Timer, TimerPatch, TimerStore};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;

pub struct TimerService {
    store: Arc<dyn TimerStore>,
    clock: Arc<dyn Clock>,
}

impl TimerService {
    pub fn new(store: Arc<dyn TimerStore>, clock: Arc<dyn Clock>) -> Self {
        TimerService { store, clock }
    }

    /// Create and persist a new timer with a freshly allocated unique id.
    pub async fn create(
        &self,
        message: &str,
        owner: &str,
        channel: &str,
        due: DateTime<Utc>,
    ) -> Result<Timer, TimerError> {
        let id = self.allocate_id().await?;
        let timer = Timer {
            id,
            message: message.to_string(),
            owner: owner.to_string(),
            channel: channel.to_string(),
            original_due: due,
            effective_due: due,
            created_at: self.clock.now(),
            snooze_count: 0,
            delivered: false,
        };
        self.store.create(&timer).await?;
        info!("created timer {} for user {} due {}", timer.id, owner, due);
        Ok(timer)
    }

    /// All timers for `owner`; with `only_active`, only undelivered ones.
    pub async fn list_for_owner(
        &self,
        owner: &str,
        only_active: bool,
    ) -> Result<Vec<Timer>, TimerError> {
        self.store.find_for_owner(owner, only_active).await
    }

    /// Look a timer up by id, surfacing `NotFound` when it does not exist.
    pub async fn get_by_id(&self, id: &str) -> Result<Timer, TimerError> {
        self.store
            .find_unique(id)
            .await?
            .ok_or_else(|| TimerError::NotFound(id.to_string()))
    }

    /// Remove a timer. `NotFound` if the record is already gone.
    pub async fn delete(&self, timer: &Timer) -> Result<(), TimerError> {
        self.store.delete(&timer.id).await?;
        info!("deleted timer {}", timer.id);
        Ok(())
    }

    /// Postpone a timer: move `effective_due`, bump the snooze counter, and
    /// reset `delivered` so it fires again. `original_due` is untouched.
    pub async fn snooze(
        &self,
        timer: &Timer,
        new_due: DateTime<Utc>,
    ) -> Result<Timer, TimerError> {
        let updated = self
            .store
            .update(&timer.id, TimerPatch::snooze(new_due))
            .await?;
        info!(
            "snoozed timer {} to {} (count {})",
            updated.id, updated.effective_due, updated.snooze_count
        );
        Ok(updated)
    }

    /// Change a timer's message and/or due time. A new due time moves
    /// `effective_due` only; `snooze_count` and `delivered` are untouched.
    /// With neither field provided this is a no-op, not an error: the
    /// front-end rejects empty edits before calling.
    pub async fn edit(
        &self,
        timer: &Timer,
        new_message: Option<&str>,
        new_due: Option<DateTime<Utc>>,
    ) -> Result<Timer, TimerError> {
        let patch = TimerPatch {
            message: new_message.map(str::to_string),
            effective_due: new_due,
            ..TimerPatch::default()
        };
        if patch.is_empty() {
            return Ok(timer.clone());
        }

        let updated = self.store.update(&timer.id, patch).await?;
        info!("edited timer {}", updated.id);
        Ok(updated)
    }

    /// Generate candidate ids until the store reports one unused. The store is
    /// the authority on uniqueness; there is no local cache and no retry cap.
    async fn allocate_id(&self) -> Result<String, TimerError> {
        loop {
            let id = random_id();
            if self.store.find_unique(&id).await?.is_none() {
                return Ok(id);
            }
            debug!("timer id {id} already taken, regenerating");
        }
    }
}
