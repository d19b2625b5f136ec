//! Notification presenter: timer + event kind -> structured payload.
//!
//! Pure mapping, no I/O. The payload carries everything the transport needs to
//! render a Discord embed (title, color, field set, optional mention content)
//! and stays inspectable for tests.

use crate::database::Timer;
use chrono::{DateTime, Utc};
use serenity::builder::CreateEmbed;

/// What happened to the timer. Exhaustive; every kind has a fixed title and
/// color, so a new kind cannot be added without deciding its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Created,
    Deleted,
    Snoozed,
    Edited,
    Due,
}

impl TimerEvent {
    pub fn title(self) -> &'static str {
        match self {
            TimerEvent::Created => "Timer Created",
            TimerEvent::Deleted => "Timer Deleted",
            TimerEvent::Snoozed => "Timer Snoozed",
            TimerEvent::Edited => "Timer Edited",
            TimerEvent::Due => "Timer Due",
        }
    }

    pub fn color(self) -> u32 {
        match self {
            TimerEvent::Created => 0x00ff00,
            TimerEvent::Deleted => 0xff0000,
            TimerEvent::Snoozed => 0x00ffff,
            TimerEvent::Edited => 0xffff00,
            TimerEvent::Due => 0x0000ff,
        }
    }

    /// Whether the "Due" field carries a relative duration. Omitted on Created
    /// and on the due delivery itself, where the bare timestamp reads better.
    fn due_includes_duration(self) -> bool {
        !matches!(self, TimerEvent::Due)
    }

    /// Whether the "Created" field carries a relative duration. Omitted on the
    /// initial Created event (it would always read "now").
    fn created_includes_duration(self) -> bool {
        !matches!(self, TimerEvent::Created)
    }
}

/// One embed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Structured notification payload, renderable as a Discord embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerNotification {
    pub title: String,
    pub color: u32,
    pub description: String,
    pub fields: Vec<EmbedField>,
    /// Plain message content sent alongside the embed; used to ping the owner
    /// on due delivery.
    pub content: Option<String>,
}

impl TimerNotification {
    pub fn to_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::default();
        embed.title(&self.title);
        embed.color(self.color);
        embed.description(&self.description);
        for field in &self.fields {
            embed.field(&field.name, &field.value, field.inline);
        }
        embed
    }
}

/// Build the notification for `timer` and `event`, formatting times against
/// `now`.
pub fn notification(timer: &Timer, event: TimerEvent, now: DateTime<Utc>) -> TimerNotification {
    let mut fields = vec![
        EmbedField {
            name: "Id".to_string(),
            value: timer.id.clone(),
            inline: true,
        },
        EmbedField {
            name: "Owner".to_string(),
            value: mention(&timer.owner),
            inline: true,
        },
        EmbedField {
            name: "Due".to_string(),
            value: format_time(timer.effective_due, now, event.due_includes_duration()),
            inline: true,
        },
        EmbedField {
            name: "Created".to_string(),
            value: format_time(timer.created_at, now, event.created_includes_duration()),
            inline: true,
        },
    ];

    if timer.snooze_count > 0 {
        fields.push(EmbedField {
            name: "Snooze count".to_string(),
            value: timer.snooze_count.to_string(),
            inline: true,
        });
    }

    let content = match event {
        TimerEvent::Due => Some(mention(&timer.owner)),
        _ => None,
    };

    TimerNotification {
        title: event.title().to_string(),
        color: event.color(),
        description: timer.message.clone(),
        fields,
        content,
    }
}

fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

fn format_time(instant: DateTime<Utc>, now: DateTime<Utc>, include_duration: bool) -> String {
    let absolute = instant.format("%d/%m/%Y, %H:%M:%S").to_string();
    if include_duration {
        format!("{absolute} ({})", format_relative(instant, now))
    } else {
        absolute
    }
}

/// Humanize the distance between `instant` and `now`: "in 3 hours",
/// "2 days ago", "now".
pub fn format_relative(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (instant - now).num_seconds();
    if seconds == 0 {
        return "now".to_string();
    }

    let distance = humanize_seconds(seconds.unsigned_abs());
    if seconds > 0 {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

fn humanize_seconds(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let (count, unit) = if seconds >= YEAR {
        (seconds / YEAR, "year")
    } else if seconds >= MONTH {
        (seconds / MONTH, "month")
    } else if seconds >= DAY {
        (seconds / DAY, "day")
    } else if seconds >= HOUR {
        (seconds / HOUR, "hour")
    } else if seconds >= MINUTE {
        (seconds / MINUTE, "minute")
    } else {
        (seconds, "second")
    };

    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
