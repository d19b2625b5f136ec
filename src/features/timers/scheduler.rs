//! Due-timer polling scheduler.
//!
//! Scans the store for due, undelivered timers on a fixed cadence, delivers a
//! one-time notification for each, and marks it delivered. An explicit
//! start/stop lifecycle (no ambient global timer) lets tests drive single
//! cycles through [`DueTimerScheduler::run_cycle`] instead of waiting on the
//! wall clock.
//!
//! Known limitation, inherited deliberately: the scan and the mark-delivered
//! write are two separate store operations. A snooze that lands between them
//! and still leaves the timer in the past can cause a second delivery. The
//! window is one cycle's delivery latency; delivery is at-least-once, not
//! exactly-once, under that race and under owner-resolution failure.

use super::embeds::{notification, TimerEvent};
use super::transport::DeliveryTransport;
use crate::core::{Clock, TimerError};
use crate::database::{Timer, TimerPatch, TimerStore};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub struct DueTimerScheduler {
    store: Arc<dyn TimerStore>,
    transport: Arc<dyn DeliveryTransport>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    shutdown: Notify,
}

impl DueTimerScheduler {
    pub fn new(
        store: Arc<dyn TimerStore>,
        transport: Arc<dyn DeliveryTransport>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(DueTimerScheduler {
            store,
            transport,
            clock,
            poll_interval,
            shutdown: Notify::new(),
        })
    }

    /// Spawn the polling task. The first cycle runs immediately, then one per
    /// interval until [`stop`](Self::stop) is called.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.poll_interval);
            info!(
                "due-timer scheduler started (interval: {}s)",
                scheduler.poll_interval.as_secs()
            );
            loop {
                tokio::select! {
                    _ = interval.tick() => scheduler.run_cycle().await,
                    _ = scheduler.shutdown.notified() => {
                        info!("due-timer scheduler stopped");
                        break;
                    }
                }
            }
        })
    }

    /// Signal the polling task to exit after its current cycle.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    /// One polling cycle: scan for due timers and deliver each. A failure on
    /// one timer never aborts the rest of the cycle.
    pub async fn run_cycle(&self) {
        let now = self.clock.now();
        let due = match self.store.find_due(now).await {
            Ok(due) => due,
            Err(err) => {
                error!("due-timer scan failed: {err}");
                return;
            }
        };

        if due.is_empty() {
            debug!("no due timers at {now}");
            return;
        }
        debug!("{} timer(s) due at {now}", due.len());

        for timer in due {
            if let Err(err) = self.deliver(&timer).await {
                error!("failed to deliver timer {}: {err}", timer.id);
            }
        }
    }

    /// Deliver one due timer and mark it delivered. Leaves the record
    /// undelivered (for retry next cycle) when the owner cannot be resolved or
    /// the send fails.
    async fn deliver(&self, timer: &Timer) -> Result<(), TimerError> {
        let Some(owner) = self.transport.resolve_user(&timer.owner).await? else {
            warn!(
                "could not find owner {} for timer {}, not delivering",
                timer.owner, timer.id
            );
            return Ok(());
        };

        // Prefer the channel the timer was created in; fall back to a DM with
        // the owner when it cannot be reached.
        let channel = match self.transport.resolve_channel(&timer.channel).await? {
            Some(channel) => channel,
            None => self.transport.open_direct_channel(&owner).await?,
        };

        let note = notification(timer, TimerEvent::Due, self.clock.now());
        self.transport.send(&channel, &note).await?;

        self.store
            .update(&timer.id, TimerPatch::delivered())
            .await?;
        info!("delivered timer {} to channel {channel}", timer.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::database::MemoryTimerStore;
    use crate::features::timers::embeds::TimerNotification;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Transport double: resolution behavior is toggled per test, every
    /// successful send is recorded.
    #[derive(Default)]
    struct MockTransport {
        owner_unresolved: AtomicBool,
        channel_unresolved: AtomicBool,
        sends: Mutex<Vec<(String, TimerNotification)>>,
    }

    impl MockTransport {
        fn sends(&self) -> Vec<(String, TimerNotification)> {
            self.sends.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliveryTransport for MockTransport {
        async fn resolve_channel(&self, channel_id: &str) -> Result<Option<String>, TimerError> {
            if self.channel_unresolved.load(Ordering::SeqCst) {
                Ok(None)
            } else {
                Ok(Some(channel_id.to_string()))
            }
        }

        async fn resolve_user(&self, user_id: &str) -> Result<Option<String>, TimerError> {
            if self.owner_unresolved.load(Ordering::SeqCst) {
                Ok(None)
            } else {
                Ok(Some(user_id.to_string()))
            }
        }

        async fn open_direct_channel(&self, user_id: &str) -> Result<String, TimerError> {
            Ok(format!("dm:{user_id}"))
        }

        async fn send(
            &self,
            channel_id: &str,
            note: &TimerNotification,
        ) -> Result<(), TimerError> {
            // A poison message simulates the platform rejecting the send
            if note.description == "poison" {
                return Err(TimerError::Transport("send rejected".to_string()));
            }
            self.sends
                .lock()
                .unwrap()
                .push((channel_id.to_string(), note.clone()));
            Ok(())
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, hour, 0, 0).unwrap()
    }

    fn timer(id: &str, message: &str, due: DateTime<Utc>) -> Timer {
        Timer {
            id: id.to_string(),
            message: message.to_string(),
            owner: "u1".to_string(),
            channel: "c1".to_string(),
            original_due: due,
            effective_due: due,
            created_at: due - chrono::Duration::hours(1),
            snooze_count: 0,
            delivered: false,
        }
    }

    struct Fixture {
        store: Arc<MemoryTimerStore>,
        transport: Arc<MockTransport>,
        clock: Arc<ManualClock>,
        scheduler: Arc<DueTimerScheduler>,
    }

    fn fixture(now: DateTime<Utc>) -> Fixture {
        let store = Arc::new(MemoryTimerStore::new());
        let transport = Arc::new(MockTransport::default());
        let clock = Arc::new(ManualClock::new(now));
        let scheduler = DueTimerScheduler::new(
            store.clone(),
            transport.clone(),
            clock.clone(),
            Duration::from_secs(60),
        );
        Fixture {
            store,
            transport,
            clock,
            scheduler,
        }
    }

    #[tokio::test]
    async fn test_due_timer_is_delivered_exactly_once() {
        let f = fixture(at(12));
        f.store.create(&timer("abcd", "tea", at(11))).await.unwrap();

        f.scheduler.run_cycle().await;

        let sends = f.transport.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, "c1");
        assert_eq!(sends[0].1.title, "Timer Due");
        assert_eq!(sends[0].1.content.as_deref(), Some("<@u1>"));

        let stored = f.store.find_unique("abcd").await.unwrap().unwrap();
        assert!(stored.delivered);

        // A later cycle must not deliver it again
        f.clock.advance(chrono::Duration::minutes(5));
        f.scheduler.run_cycle().await;
        assert_eq!(f.transport.sends().len(), 1);
    }

    #[tokio::test]
    async fn test_future_timer_is_left_alone() {
        let f = fixture(at(12));
        f.store.create(&timer("abcd", "tea", at(18))).await.unwrap();

        f.scheduler.run_cycle().await;

        assert!(f.transport.sends().is_empty());
        let stored = f.store.find_unique("abcd").await.unwrap().unwrap();
        assert!(!stored.delivered);
    }

    #[tokio::test]
    async fn test_unresolved_owner_is_retried_next_cycle() {
        let f = fixture(at(12));
        f.store.create(&timer("abcd", "tea", at(11))).await.unwrap();

        f.transport.owner_unresolved.store(true, Ordering::SeqCst);
        f.scheduler.run_cycle().await;

        assert!(f.transport.sends().is_empty());
        let stored = f.store.find_unique("abcd").await.unwrap().unwrap();
        assert!(!stored.delivered, "skipped timer must stay undelivered");

        // Owner becomes resolvable again: the same timer is picked up
        f.transport.owner_unresolved.store(false, Ordering::SeqCst);
        f.scheduler.run_cycle().await;

        assert_eq!(f.transport.sends().len(), 1);
        let stored = f.store.find_unique("abcd").await.unwrap().unwrap();
        assert!(stored.delivered);
    }

    #[tokio::test]
    async fn test_unresolved_channel_falls_back_to_dm() {
        let f = fixture(at(12));
        f.store.create(&timer("abcd", "tea", at(11))).await.unwrap();

        f.transport.channel_unresolved.store(true, Ordering::SeqCst);
        f.scheduler.run_cycle().await;

        let sends = f.transport.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, "dm:u1");
        let stored = f.store.find_unique("abcd").await.unwrap().unwrap();
        assert!(stored.delivered);
    }

    #[tokio::test]
    async fn test_one_failing_timer_does_not_abort_the_cycle() {
        let f = fixture(at(12));
        f.store
            .create(&timer("badd", "poison", at(11)))
            .await
            .unwrap();
        f.store.create(&timer("good", "tea", at(11))).await.unwrap();

        f.scheduler.run_cycle().await;

        let sends = f.transport.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].1.description, "tea");

        let good = f.store.find_unique("good").await.unwrap().unwrap();
        assert!(good.delivered);
        let bad = f.store.find_unique("badd").await.unwrap().unwrap();
        assert!(!bad.delivered, "failed send stays undelivered for retry");
    }

    #[tokio::test]
    async fn test_snoozed_timer_fires_again() {
        let f = fixture(at(12));
        f.store.create(&timer("abcd", "tea", at(11))).await.unwrap();

        f.scheduler.run_cycle().await;
        assert_eq!(f.transport.sends().len(), 1);

        // Snooze to 13:00: delivered resets, a cycle at 12:05 stays quiet
        f.store
            .update("abcd", TimerPatch::snooze(at(13)))
            .await
            .unwrap();
        f.clock.set(at(12) + chrono::Duration::minutes(5));
        f.scheduler.run_cycle().await;
        assert_eq!(f.transport.sends().len(), 1);

        // Past the snoozed due time it fires once more
        f.clock.set(at(14));
        f.scheduler.run_cycle().await;
        let sends = f.transport.sends();
        assert_eq!(sends.len(), 2);
        let snooze_field = sends[1]
            .1
            .fields
            .iter()
            .find(|field| field.name == "Snooze count")
            .expect("snoozed delivery carries a snooze count");
        assert_eq!(snooze_field.value, "1");
    }

    #[tokio::test]
    async fn test_start_runs_immediately_and_stop_ends_the_task() {
        let f = fixture(at(12));
        f.store.create(&timer("abcd", "tea", at(11))).await.unwrap();

        let handle = f.scheduler.start();

        // First tick of the interval fires without waiting a full period
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(f.transport.sends().len(), 1);

        f.scheduler.stop();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler task exits after stop")
            .unwrap();
    }
}
