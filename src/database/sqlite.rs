//! Sqlite-backed timer store.
//!
//! Single thread-safe connection guarded by a mutex; every operation is a
//! short synchronous statement, so the lock is never held across an await.
//! The schema is bootstrapped on open. Timestamps are stored as unix
//! milliseconds, `delivered` as 0/1.

use super::{apply_patch, Timer, TimerPatch, TimerStore};
use crate::core::TimerError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlite::{Connection, ConnectionThreadSafe, State};
use std::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS timers (
        id TEXT PRIMARY KEY,
        message TEXT NOT NULL,
        owner TEXT NOT NULL,
        channel TEXT NOT NULL,
        original_due INTEGER NOT NULL,
        effective_due INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        snooze_count INTEGER NOT NULL DEFAULT 0,
        delivered INTEGER NOT NULL DEFAULT 0
    )
";

const COLUMNS: &str = "id, message, owner, channel, original_due, effective_due, \
                       created_at, snooze_count, delivered";

pub struct SqliteTimerStore {
    conn: Mutex<ConnectionThreadSafe>,
}

impl SqliteTimerStore {
    /// Open (or create) the database at `path` and bootstrap the schema.
    /// `:memory:` gives a throwaway store.
    pub fn open(path: &str) -> Result<Self, TimerError> {
        let conn = Connection::open_thread_safe(path).map_err(TimerError::store)?;
        conn.execute(SCHEMA).map_err(TimerError::store)?;
        Ok(SqliteTimerStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ConnectionThreadSafe>, TimerError> {
        self.conn
            .lock()
            .map_err(|_| TimerError::Store("connection mutex poisoned".to_string()))
    }

    fn read_timer(statement: &sqlite::Statement<'_>) -> Result<Timer, TimerError> {
        Ok(Timer {
            id: statement.read::<String, _>("id").map_err(TimerError::store)?,
            message: statement
                .read::<String, _>("message")
                .map_err(TimerError::store)?,
            owner: statement
                .read::<String, _>("owner")
                .map_err(TimerError::store)?,
            channel: statement
                .read::<String, _>("channel")
                .map_err(TimerError::store)?,
            original_due: from_millis(
                statement
                    .read::<i64, _>("original_due")
                    .map_err(TimerError::store)?,
            )?,
            effective_due: from_millis(
                statement
                    .read::<i64, _>("effective_due")
                    .map_err(TimerError::store)?,
            )?,
            created_at: from_millis(
                statement
                    .read::<i64, _>("created_at")
                    .map_err(TimerError::store)?,
            )?,
            snooze_count: statement
                .read::<i64, _>("snooze_count")
                .map_err(TimerError::store)? as u32,
            delivered: statement
                .read::<i64, _>("delivered")
                .map_err(TimerError::store)?
                != 0,
        })
    }

    fn collect_rows(mut statement: sqlite::Statement<'_>) -> Result<Vec<Timer>, TimerError> {
        let mut timers = Vec::new();
        while let State::Row = statement.next().map_err(TimerError::store)? {
            timers.push(Self::read_timer(&statement)?);
        }
        Ok(timers)
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, TimerError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| TimerError::Store(format!("timestamp {millis} out of range")))
}

#[async_trait]
impl TimerStore for SqliteTimerStore {
    async fn create(&self, timer: &Timer) -> Result<(), TimerError> {
        let conn = self.lock()?;
        let mut statement = conn
            .prepare(format!(
                "INSERT INTO timers ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))
            .map_err(TimerError::store)?;
        statement
            .bind((1, timer.id.as_str()))
            .map_err(TimerError::store)?;
        statement
            .bind((2, timer.message.as_str()))
            .map_err(TimerError::store)?;
        statement
            .bind((3, timer.owner.as_str()))
            .map_err(TimerError::store)?;
        statement
            .bind((4, timer.channel.as_str()))
            .map_err(TimerError::store)?;
        statement
            .bind((5, timer.original_due.timestamp_millis()))
            .map_err(TimerError::store)?;
        statement
            .bind((6, timer.effective_due.timestamp_millis()))
            .map_err(TimerError::store)?;
        statement
            .bind((7, timer.created_at.timestamp_millis()))
            .map_err(TimerError::store)?;
        statement
            .bind((8, timer.snooze_count as i64))
            .map_err(TimerError::store)?;
        statement
            .bind((9, timer.delivered as i64))
            .map_err(TimerError::store)?;
        statement.next().map_err(TimerError::store)?;
        Ok(())
    }

    async fn find_unique(&self, id: &str) -> Result<Option<Timer>, TimerError> {
        let conn = self.lock()?;
        let mut statement = conn
            .prepare(format!("SELECT {COLUMNS} FROM timers WHERE id = ?"))
            .map_err(TimerError::store)?;
        statement.bind((1, id)).map_err(TimerError::store)?;

        match statement.next().map_err(TimerError::store)? {
            State::Row => Ok(Some(Self::read_timer(&statement)?)),
            State::Done => Ok(None),
        }
    }

    async fn find_for_owner(
        &self,
        owner: &str,
        only_active: bool,
    ) -> Result<Vec<Timer>, TimerError> {
        let conn = self.lock()?;
        let query = if only_active {
            format!("SELECT {COLUMNS} FROM timers WHERE owner = ? AND delivered = 0")
        } else {
            format!("SELECT {COLUMNS} FROM timers WHERE owner = ?")
        };
        let mut statement = conn.prepare(query).map_err(TimerError::store)?;
        statement.bind((1, owner)).map_err(TimerError::store)?;
        Self::collect_rows(statement)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Timer>, TimerError> {
        let conn = self.lock()?;
        let mut statement = conn
            .prepare(format!(
                "SELECT {COLUMNS} FROM timers WHERE effective_due <= ? AND delivered = 0"
            ))
            .map_err(TimerError::store)?;
        statement
            .bind((1, now.timestamp_millis()))
            .map_err(TimerError::store)?;
        Self::collect_rows(statement)
    }

    async fn update(&self, id: &str, patch: TimerPatch) -> Result<Timer, TimerError> {
        let conn = self.lock()?;

        // Read-modify-write; the connection mutex serializes conflicting
        // writers to the same record.
        let mut select = conn
            .prepare(format!("SELECT {COLUMNS} FROM timers WHERE id = ?"))
            .map_err(TimerError::store)?;
        select.bind((1, id)).map_err(TimerError::store)?;
        let mut timer = match select.next().map_err(TimerError::store)? {
            State::Row => Self::read_timer(&select)?,
            State::Done => return Err(TimerError::NotFound(id.to_string())),
        };
        drop(select);

        apply_patch(&mut timer, &patch);

        let mut statement = conn
            .prepare(
                "UPDATE timers SET message = ?, effective_due = ?, snooze_count = ?, \
                 delivered = ? WHERE id = ?",
            )
            .map_err(TimerError::store)?;
        statement
            .bind((1, timer.message.as_str()))
            .map_err(TimerError::store)?;
        statement
            .bind((2, timer.effective_due.timestamp_millis()))
            .map_err(TimerError::store)?;
        statement
            .bind((3, timer.snooze_count as i64))
            .map_err(TimerError::store)?;
        statement
            .bind((4, timer.delivered as i64))
            .map_err(TimerError::store)?;
        statement.bind((5, id)).map_err(TimerError::store)?;
        statement.next().map_err(TimerError::store)?;

        Ok(timer)
    }

    async fn delete(&self, id: &str) -> Result<(), TimerError> {
        let conn = self.lock()?;
        let mut statement = conn
            .prepare("DELETE FROM timers WHERE id = ?")
            .map_err(TimerError::store)?;
        statement.bind((1, id)).map_err(TimerError::store)?;
        statement.next().map_err(TimerError::store)?;
        drop(statement);

        if conn.change_count() == 0 {
            return Err(TimerError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
