//! Defines the core data models and database queries for ledger records.

use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    category::{CategoryName, get_or_create_category},
    database_id::{CategoryId, RecordId},
    db::{get_decimal, get_timestamp},
    timestamp::{Timestamp, format_timestamp, now_utc, parse_timestamp},
};

// ============================================================================
// MODELS
// ============================================================================

/// One ledger entry: money received from or spent at a source establishment.
///
/// To create a new `Record`, use [NewRecord::build] and [create_record].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The ID of the record.
    pub id: RecordId,
    /// When the sale or expense happened.
    pub timestamp: Timestamp,
    /// The establishment the record belongs to, e.g. "Lanchonete da Cau".
    pub source: String,
    /// The ID of the category the record belongs to.
    pub category_id: CategoryId,
    /// The amount of money, never stored as a binary float.
    pub amount: Decimal,
    /// Free text notes about the record.
    pub notes: Option<String>,
}

/// A validated record that has not been stored yet.
///
/// The category is referred to by name and is created on demand when the
/// record is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// When the sale or expense happened. Defaults to now.
    pub timestamp: Timestamp,
    /// The trimmed, non-empty source establishment.
    pub source: String,
    /// The name of the category, matched ignoring case.
    pub category_name: CategoryName,
    /// The amount of money. Defaults to zero.
    pub amount: Decimal,
    /// Trimmed notes.
    pub notes: Option<String>,
}

impl NewRecord {
    /// Start building a record for `source` in the category `category_name`.
    ///
    /// The caller should ensure that `source` is not blank, see
    /// [NewRecord::try_from] for the validating constructor.
    pub fn build(source: &str, category_name: CategoryName) -> Self {
        Self {
            timestamp: now_utc(),
            source: source.trim().to_owned(),
            category_name,
            amount: Decimal::ZERO,
            notes: None,
        }
    }

    /// Set when the record happened.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the amount of the record.
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// Set the notes of the record, surrounding whitespace is removed.
    pub fn notes(mut self, notes: Option<&str>) -> Self {
        self.notes = notes.map(|notes| notes.trim().to_owned());
        self
    }
}

/// The JSON body for creating a record.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    /// When the record happened, the current time is used if omitted.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// The establishment the record belongs to.
    #[serde(default)]
    pub source: String,
    /// The category name, created if it does not exist yet.
    #[serde(default)]
    pub category_name: String,
    /// The amount of money, as a JSON string or number. Only a string keeps
    /// trailing zeros such as in `"119.90"`.
    #[serde(default)]
    pub amount: Decimal,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl TryFrom<CreateRecordRequest> for NewRecord {
    type Error = Error;

    fn try_from(request: CreateRecordRequest) -> Result<Self, Self::Error> {
        let source = request.source.trim();

        if source.is_empty() {
            return Err(Error::EmptySource);
        }

        let category_name = CategoryName::new(&request.category_name)?;

        let timestamp = match request.timestamp.as_deref().map(str::trim) {
            None | Some("") => now_utc(),
            Some(text) => {
                parse_timestamp(text).ok_or_else(|| Error::InvalidTimestamp(text.to_owned()))?
            }
        };

        Ok(NewRecord::build(source, category_name)
            .timestamp(timestamp)
            .amount(request.amount)
            .notes(request.notes.as_deref()))
    }
}

/// A partial update to a record, `None` fields are left unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordChanges {
    /// The new timestamp.
    pub timestamp: Option<Timestamp>,
    /// The new, trimmed and non-empty source.
    pub source: Option<String>,
    /// The name of the new category, created if it does not exist yet.
    pub category_name: Option<CategoryName>,
    /// The new amount.
    pub amount: Option<Decimal>,
    /// The new, trimmed notes.
    pub notes: Option<String>,
}

/// The JSON body for updating a record, every field is optional.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    /// The new timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// The new source, ignored if blank.
    #[serde(default)]
    pub source: Option<String>,
    /// The new category name, ignored if blank.
    #[serde(default)]
    pub category_name: Option<String>,
    /// The new amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// The new notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl TryFrom<UpdateRecordRequest> for RecordChanges {
    type Error = Error;

    fn try_from(request: UpdateRecordRequest) -> Result<Self, Self::Error> {
        let timestamp = request
            .timestamp
            .map(|text| parse_timestamp(&text).ok_or(Error::InvalidTimestamp(text)))
            .transpose()?;

        let source = request
            .source
            .map(|source| source.trim().to_owned())
            .filter(|source| !source.is_empty());

        let category_name = request
            .category_name
            .and_then(|name| CategoryName::new(&name).ok());

        Ok(RecordChanges {
            timestamp,
            source,
            category_name,
            amount: request.amount,
            notes: request.notes.map(|notes| notes.trim().to_owned()),
        })
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Store a new record, creating its category if needed.
///
/// The category lookup and the insert run in one SQL transaction, so either
/// both happen or neither does.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_record(new_record: NewRecord, connection: &Connection) -> Result<Record, Error> {
    let transaction = connection.unchecked_transaction()?;

    let category = get_or_create_category(&new_record.category_name, &transaction)?;
    let record = insert_record(&new_record, category.id, &transaction)?;

    transaction.commit()?;

    Ok(record)
}

/// Insert `new_record` under an existing category.
///
/// # Errors
/// This function will return a [Error::SqlError] if `category_id` does not
/// refer to a category or there is some other SQL error.
pub(crate) fn insert_record(
    new_record: &NewRecord,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Record, Error> {
    connection
        .prepare(
            "INSERT INTO record (timestamp, source, category_id, amount, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, timestamp, source, category_id, amount, notes",
        )?
        .query_row(
            params![
                format_timestamp(new_record.timestamp),
                new_record.source,
                category_id,
                new_record.amount.to_string(),
                new_record.notes,
            ],
            map_record_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a record from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid record,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_record(id: RecordId, connection: &Connection) -> Result<Record, Error> {
    let record = connection
        .prepare(
            "SELECT id, timestamp, source, category_id, amount, notes FROM record WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_record_row)?;

    Ok(record)
}

/// Apply `changes` to the record `id`.
///
/// A category named in `changes` is created if needed. Nothing is written if
/// the record does not exist.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRecord] if `id` does not refer to a valid record,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_record(
    id: RecordId,
    changes: RecordChanges,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let category_id = changes
        .category_name
        .as_ref()
        .map(|name| get_or_create_category(name, &transaction))
        .transpose()?
        .map(|category| category.id);

    let rows_affected = transaction.execute(
        "UPDATE record SET \
            timestamp = COALESCE(?1, timestamp), \
            source = COALESCE(?2, source), \
            category_id = COALESCE(?3, category_id), \
            amount = COALESCE(?4, amount), \
            notes = COALESCE(?5, notes) \
        WHERE id = ?6",
        params![
            changes.timestamp.map(format_timestamp),
            changes.source,
            category_id,
            changes.amount.map(|amount| amount.to_string()),
            changes.notes,
            id,
        ],
    )?;

    // Dropping the transaction without committing discards any new category.
    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecord);
    }

    transaction.commit()?;

    Ok(())
}

/// Delete the record `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRecord] if `id` does not refer to a valid record,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_record(id: RecordId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM record WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecord);
    }

    Ok(())
}

/// Get the total number of records in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_records(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM record;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the record table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_record_table(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            source TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            amount TEXT NOT NULL,
            notes TEXT,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_record_timestamp ON record(timestamp);",
    )?;

    Ok(())
}

fn map_record_row(row: &Row) -> Result<Record, rusqlite::Error> {
    Ok(Record {
        id: row.get(0)?,
        timestamp: get_timestamp(row, 1)?,
        source: row.get(2)?,
        category_id: row.get(3)?,
        amount: get_decimal(row, 4)?,
        notes: row.get(5)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
