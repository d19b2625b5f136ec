//! # Features
//!
//! Feature modules for the timer bot.

pub mod timers;

pub use timers::{
    notification, resolve_due, DateParser, DeliveryTransport, DiscordTransport,
    DueTimerScheduler, EmbedField, TimerEvent, TimerNotification, TimerService,
};
