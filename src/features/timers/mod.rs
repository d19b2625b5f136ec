//! # Feature: Reminder Timers
//!
//! User-created reminder timers: create, list, edit, snooze, delete, and
//! autonomous one-time delivery of due notifications. The lifecycle service is
//! driven by the (external) command front-end; the scheduler runs on its own
//! cadence against the same store.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Injectable clock and explicit scheduler start/stop lifecycle
//! - 1.1.0: Edit support (message and/or due time)
//! - 1.0.0: Initial release with create/list/snooze/delete and due delivery

pub mod dates;
pub mod embeds;
pub mod id;
pub mod lifecycle;
pub mod scheduler;
pub mod transport;

pub use dates::{resolve_due, DateParser};
pub use embeds::{notification, EmbedField, TimerEvent, TimerNotification};
pub use lifecycle::TimerService;
pub use scheduler::DueTimerScheduler;
pub use transport::{DeliveryTransport, DiscordTransport};
