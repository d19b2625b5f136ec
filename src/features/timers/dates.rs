//! Due-time resolution on top of an opaque natural-language date parser.
//!
//! The parser itself is an external collaborator (free text in, absolute
//! timestamp or failure out). This module owns the retry phrasing and the
//! bare-date normalization that sit between user input and a usable due time.

use crate::core::TimerError;
use chrono::{DateTime, Timelike, Utc};

/// Opaque natural-language date parser.
pub trait DateParser: Send + Sync {
    /// Parse free text into an absolute timestamp, or `None` on failure.
    fn parse(&self, text: &str) -> Option<DateTime<Utc>>;
}

impl<F> DateParser for F
where
    F: Fn(&str) -> Option<DateTime<Utc>> + Send + Sync,
{
    fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        self(text)
    }
}

/// Resolve user-entered text to a due time.
///
/// Tries the text verbatim, then prefixed with "in" (bare durations like
/// "3 hours"), then with "on" (bare dates like "friday"). Failure of all three
/// is a validation error. The result is then normalized: parsers default a
/// date-without-time to midnight (or noon), which reads as a bare date, so the
/// time-of-day is replaced with `now`'s in that case.
pub fn resolve_due(
    parser: &dyn DateParser,
    text: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, TimerError> {
    let parsed = parser
        .parse(text)
        .or_else(|| parser.parse(&format!("in {text}")))
        .or_else(|| parser.parse(&format!("on {text}")))
        .ok_or_else(|| TimerError::Validation(format!("could not parse time \"{text}\"")))?;

    Ok(normalize_bare_date(parsed, now))
}

/// If `parsed` sits exactly on a midnight or noon boundary (h:00:00 with h in
/// {0, 12}), the user most likely entered a date without a time; carry over
/// the current time-of-day instead.
pub fn normalize_bare_date(parsed: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let bare = (parsed.hour() == 0 || parsed.hour() == 12)
        && parsed.minute() == 0
        && parsed.second() == 0;
    if !bare {
        return parsed;
    }

    parsed
        .with_hour(now.hour())
        .and_then(|d| d.with_minute(now.minute()))
        .and_then(|d| d.with_second(now.second()))
        .unwrap_or(parsed)
}
