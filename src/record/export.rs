//! Formats records as CSV lines.

use std::borrow::Cow;

use crate::{record::RecordRow, timestamp::format_timestamp};

/// The first line of every exported CSV document.
pub const CSV_HEADER: &str = "Id,Timestamp,Source,Category,Amount,Notes\n";

/// Quote `field` if it contains a comma, a double quote or a newline.
///
/// Double quotes inside a quoted field are doubled. Any other field is
/// returned unchanged.
pub fn escape_csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Format `row` as one CSV line terminated by `\n`.
pub fn format_csv_row(row: &RecordRow) -> String {
    format!(
        "{},{},{},{},{},{}\n",
        row.id,
        format_timestamp(row.timestamp),
        escape_csv_field(&row.source),
        escape_csv_field(row.category.as_deref().unwrap_or_default()),
        row.amount,
        escape_csv_field(row.notes.as_deref().unwrap_or_default()),
    )
}
