//! Builds the SQL predicate shared by the record list and the CSV export.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::timestamp::{Timestamp, format_timestamp, parse_timestamp};

/// The raw filter values from the query string of the list and export
/// endpoints.
///
/// Every field is optional and kept as text so that a malformed value can be
/// ignored instead of rejecting the whole request.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Only include records at or after this date-time.
    pub from: Option<String>,
    /// Only include records at or before this date-time.
    pub to: Option<String>,
    /// Only include records whose source contains this text, ignoring case.
    pub source: Option<String>,
    /// Only include records whose category name contains this text, ignoring
    /// case.
    pub category: Option<String>,
}

/// A conjunction of optional conditions on records.
///
/// Build one with [RecordFilter::from_query]. An empty filter matches every
/// record.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordFilter {
    /// Inclusive lower bound on the record timestamp.
    pub from: Option<Timestamp>,
    /// Inclusive upper bound on the record timestamp.
    pub to: Option<Timestamp>,
    /// Lower-cased text the record source must contain.
    pub source: Option<String>,
    /// Lower-cased text the category name must contain.
    pub category: Option<String>,
}

impl RecordFilter {
    /// Parse the filter from the query string values.
    ///
    /// Date-times that cannot be parsed and blank search text are dropped,
    /// they never cause an error.
    pub fn from_query(query: &RecordQuery) -> Self {
        Self {
            from: query.from.as_deref().and_then(parse_timestamp),
            to: query.to.as_deref().and_then(parse_timestamp),
            source: query.source.as_deref().and_then(normalize_needle),
            category: query.category.as_deref().and_then(normalize_needle),
        }
    }

    /// Whether the filter matches every record.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Render the filter as an SQL `WHERE` clause with positional parameters.
    ///
    /// The clause refers to the `record` table and to the `category` table
    /// joined on the record's category. It relies on the `casefold` function
    /// registered by [crate::db::initialize]. Returns an empty string for an
    /// empty filter.
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(from) = self.from {
            conditions.push("record.timestamp >= ?");
            params.push(Value::Text(format_timestamp(from)));
        }

        if let Some(to) = self.to {
            conditions.push("record.timestamp <= ?");
            params.push(Value::Text(format_timestamp(to)));
        }

        if let Some(source) = &self.source {
            conditions.push("instr(casefold(record.source), ?) > 0");
            params.push(Value::Text(source.clone()));
        }

        // A record without a category has a NULL name, which never matches.
        if let Some(category) = &self.category {
            conditions.push("instr(casefold(category.name), ?) > 0");
            params.push(Value::Text(category.clone()));
        }

        if conditions.is_empty() {
            return (String::new(), params);
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

fn normalize_needle(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_lowercase())
    }
}
