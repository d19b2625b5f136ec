// Core layer - configuration, clock, and error types
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure - timer persistence
pub mod database;

// Re-export core items for convenience
pub use self::core::{Clock, Config, ManualClock, SystemClock, TimerError};

// Re-export database items
pub use database::{MemoryTimerStore, SqliteTimerStore, Timer, TimerPatch, TimerStore};

// Re-export feature items
pub use features::{
    notification, resolve_due, DateParser, DeliveryTransport, DiscordTransport,
    DueTimerScheduler, EmbedField, TimerEvent, TimerNotification, TimerService,
};
