//! Parsing and formatting of record timestamps.
//!
//! Timestamps are stored and rendered without a UTC offset in the sortable
//! form `2024-01-15T09:00:00`, so that lexical order in the database matches
//! chronological order.

use time::{
    Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

/// The date and time a record happened, with second precision and no offset.
pub type Timestamp = PrimitiveDateTime;

/// The format timestamps are stored in.
pub(crate) const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

const DATE_TIME_FORMATS: [&[BorrowedFormatItem<'static>]; 6] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    TIMESTAMP_FORMAT,
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

/// Parse a date-time from user input, independent of the server locale.
///
/// Accepts a plain date (interpreted as midnight), a date and time separated
/// by `T` or a space with optional seconds and fractional seconds, and
/// RFC 3339 date-times with an offset, which are converted to UTC.
/// Sub-second precision is discarded.
///
/// Returns `None` if `text` is blank or not in any of these forms.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        let utc = date_time.to_offset(UtcOffset::UTC);
        return Some(truncate_to_seconds(PrimitiveDateTime::new(
            utc.date(),
            utc.time(),
        )));
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
        .or_else(|| Date::parse(text, DATE_FORMAT).ok().map(Date::midnight))
        .map(truncate_to_seconds)
}

/// Render a timestamp in the sortable ISO 8601 form without an offset, e.g.
/// `2024-01-15T09:00:00`.
pub fn format_timestamp(timestamp: Timestamp) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        timestamp.year(),
        u8::from(timestamp.month()),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    )
}

/// The current UTC time truncated to whole seconds.
pub fn now_utc() -> Timestamp {
    let now = OffsetDateTime::now_utc();

    truncate_to_seconds(PrimitiveDateTime::new(now.date(), now.time()))
}

fn truncate_to_seconds(timestamp: Timestamp) -> Timestamp {
    timestamp - Duration::nanoseconds(i64::from(timestamp.nanosecond()))
}

/// Read a timestamp that was written with [format_timestamp].
pub(crate) fn parse_stored_timestamp(text: &str) -> Result<Timestamp, time::error::Parse> {
    PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT)
}

/// Serde helpers for (de)serializing a [Timestamp] as `2024-01-15T09:00:00`.
pub mod serde_timestamp {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::{Timestamp, format_timestamp, parse_timestamp};

    /// Serialize `timestamp` as a sortable ISO 8601 string.
    pub fn serialize<S>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(*timestamp))
    }

    /// Deserialize a timestamp in any of the forms accepted by [parse_timestamp].
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;

        parse_timestamp(&text)
            .ok_or_else(|| de::Error::custom(format!("\"{text}\" is not a valid timestamp")))
    }
}
