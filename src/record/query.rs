//! Reads filtered, ordered record projections for the list and export
//! endpoints.

use std::ops::ControlFlow;

use rusqlite::{Connection, Row, Statement, params_from_iter, types::Value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::RecordId,
    db::{get_decimal, get_timestamp},
    record::RecordFilter,
    timestamp::{Timestamp, serde_timestamp},
};

/// A record joined with the name of its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    /// The ID of the record.
    pub id: RecordId,
    /// When the record happened.
    #[serde(with = "serde_timestamp")]
    pub timestamp: Timestamp,
    /// The establishment the record belongs to.
    pub source: String,
    /// The category name, `None` if the category could not be resolved.
    pub category: Option<String>,
    /// The amount of money, written as a decimal string so that no digits
    /// or trailing zeros are lost.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Free text notes.
    pub notes: Option<String>,
}

const SELECT_RECORD_ROWS: &str = "SELECT record.id, record.timestamp, record.source, \
    category.name, record.amount, record.notes \
    FROM record LEFT JOIN category ON category.id = record.category_id";

// Newest first, records with the same timestamp in insertion order.
const ORDER_RECORD_ROWS: &str = "ORDER BY record.timestamp DESC, record.id ASC";

/// A prepared query for the records matching a [RecordFilter].
///
/// The rows are read lazily from the database cursor, so a caller can
/// process any number of records without holding them all in memory.
pub struct RecordRowsQuery<'conn> {
    statement: Statement<'conn>,
    params: Vec<Value>,
}

impl<'conn> RecordRowsQuery<'conn> {
    /// Prepare the query for the records matching `filter`.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if the statement could
    /// not be prepared.
    pub fn prepare(filter: &RecordFilter, connection: &'conn Connection) -> Result<Self, Error> {
        let (where_clause, params) = filter.to_sql();
        let sql = format!("{SELECT_RECORD_ROWS} {where_clause} {ORDER_RECORD_ROWS}");
        let statement = connection.prepare(&sql)?;

        Ok(Self { statement, params })
    }

    /// Call `visit` with each matching row in order until it returns
    /// [ControlFlow::Break] or the rows run out.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if a row could not be
    /// read. Rows visited before the error are not rolled back.
    pub fn for_each<F>(&mut self, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(RecordRow) -> ControlFlow<()>,
    {
        let mut rows = self.statement.query(params_from_iter(self.params.iter()))?;

        while let Some(row) = rows.next()? {
            if visit(map_record_row(row)?).is_break() {
                break;
            }
        }

        Ok(())
    }
}

/// Get every record matching `filter`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_record_rows(filter: &RecordFilter, connection: &Connection) -> Result<Vec<RecordRow>, Error> {
    let mut record_rows = Vec::new();

    RecordRowsQuery::prepare(filter, connection)?.for_each(|row| {
        record_rows.push(row);
        ControlFlow::Continue(())
    })?;

    Ok(record_rows)
}

fn map_record_row(row: &Row) -> Result<RecordRow, rusqlite::Error> {
    Ok(RecordRow {
        id: row.get(0)?,
        timestamp: get_timestamp(row, 1)?,
        source: row.get(2)?,
        category: row.get(3)?,
        amount: get_decimal(row, 4)?,
        notes: row.get(5)?,
    })
}
