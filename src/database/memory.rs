//! In-memory timer store backed by DashMap.
//!
//! Used as the test fixture throughout the crate and usable by embedders that
//! do not need persistence across restarts.

use super::{apply_patch, Timer, TimerPatch, TimerStore};
use crate::core::TimerError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryTimerStore {
    timers: DashMap<String, Timer>,
}

impl MemoryTimerStore {
    pub fn new() -> Self {
        MemoryTimerStore {
            timers: DashMap::new(),
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[async_trait]
impl TimerStore for MemoryTimerStore {
    async fn create(&self, timer: &Timer) -> Result<(), TimerError> {
        match self.timers.entry(timer.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(TimerError::Store(format!(
                "duplicate timer id {}",
                timer.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(timer.clone());
                Ok(())
            }
        }
    }

    async fn find_unique(&self, id: &str) -> Result<Option<Timer>, TimerError> {
        Ok(self.timers.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_for_owner(
        &self,
        owner: &str,
        only_active: bool,
    ) -> Result<Vec<Timer>, TimerError> {
        Ok(self
            .timers
            .iter()
            .filter(|entry| entry.owner == owner)
            .filter(|entry| !only_active || !entry.delivered)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Timer>, TimerError> {
        Ok(self
            .timers
            .iter()
            .filter(|entry| entry.effective_due <= now && !entry.delivered)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update(&self, id: &str, patch: TimerPatch) -> Result<Timer, TimerError> {
        match self.timers.get_mut(id) {
            Some(mut entry) => {
                apply_patch(entry.value_mut(), &patch);
                Ok(entry.value().clone())
            }
            None => Err(TimerError::NotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), TimerError> {
        match self.timers.remove(id) {
            Some(_) => Ok(()),
            None => Err(TimerError::NotFound(id.to_string())),
        }
    }
}
