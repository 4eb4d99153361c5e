/*! Sets up the application's SQLite database and applies versioned migrations. */

use std::{str::FromStr, time::Duration};

use rusqlite::{Connection, Row, functions::FunctionFlags, types::Type};
use rust_decimal::Decimal;

use crate::{
    Error,
    category::{count_categories, create_category_table},
    demo_data::{insert_demo_records, rename_legacy_sources},
    record::{count_records, create_record_table},
    timestamp::{Timestamp, parse_stored_timestamp},
};

/// A schema or data change that is applied to a database exactly once.
struct Migration {
    version: u32,
    description: &'static str,
    apply: fn(&Connection) -> Result<(), Error>,
}

/// The migrations that make up the schema, in the order they are applied.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create category table",
        apply: create_category_table,
    },
    Migration {
        version: 2,
        description: "create record table",
        apply: create_record_table,
    },
    Migration {
        version: 3,
        description: "rename legacy record sources",
        apply: rename_legacy_sources,
    },
];

/// How long a connection waits for another connection to release a database
/// lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The demo data is tracked like a migration so that it is only ever added
/// once, even if the user later deletes every record.
const DEMO_DATA_MIGRATION: Migration = Migration {
    version: 1000,
    description: "insert demo records",
    apply: insert_demo_records,
};

/// Prepare `connection` for use by the application.
///
/// Enables foreign keys, registers the SQL functions the queries rely on and
/// applies any migrations that have not been applied to this database yet.
/// Calling this more than once on the same database is harmless.
///
/// # Errors
/// Returns an error if a migration fails, in which case the migration is
/// rolled back.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;
    register_functions(connection)?;
    create_migration_table(connection)?;

    for migration in MIGRATIONS {
        apply_migration(migration, connection)?;
    }

    Ok(())
}

/// Add the demo records to the database if it has never had demo data and
/// the ledger is empty.
///
/// [initialize] must have been called on `connection` first.
///
/// # Errors
/// Returns an error if there is an SQL error, in which case nothing is
/// inserted.
pub fn seed_demo_data(connection: &Connection) -> Result<(), Error> {
    if is_applied(DEMO_DATA_MIGRATION.version, connection)? {
        return Ok(());
    }

    if count_records(connection)? > 0 || count_categories(connection)? > 0 {
        tracing::info!("Skipping demo data because the ledger is not empty.");
        return Ok(());
    }

    apply_migration(&DEMO_DATA_MIGRATION, connection)?;

    Ok(())
}

/// Open the database at `path` for reading and writing.
///
/// `path` is a file path or a `file:` URI. The database is switched to WAL
/// mode so that connections from [open_read_connection] can read while this
/// connection writes.
///
/// # Errors
/// Returns an error if the database cannot be opened.
pub fn open_connection(path: &str) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    // In-memory databases stay in "memory" mode.
    let journal_mode: String =
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!("Opened database {path} in {journal_mode} journal mode.");

    Ok(connection)
}

/// Open a separate read-only connection to the database at `path`.
///
/// The connection has the same SQL functions as one set up by [initialize],
/// so the record queries can run on it. It does not share any lock with the
/// application's main connection.
///
/// # Errors
/// Returns an error if the database cannot be opened.
pub fn open_read_connection(path: &str) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    connection.pragma_update(None, "query_only", true)?;
    register_functions(&connection)?;

    Ok(connection)
}

/// Register the scalar functions used by the record queries.
///
/// `casefold(text)` lower-cases its argument with Unicode rules, unlike the
/// built-in `lower` which only handles ASCII. `NULL` stays `NULL`.
fn register_functions(connection: &Connection) -> Result<(), Error> {
    connection.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;

            Ok(text.map(|text| text.to_lowercase()))
        },
    )?;

    Ok(())
}

fn create_migration_table(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migration (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )?;

    Ok(())
}

fn is_applied(version: u32, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migration WHERE version = ?1)",
            [version],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn apply_migration(migration: &Migration, connection: &Connection) -> Result<(), Error> {
    if is_applied(migration.version, connection)? {
        return Ok(());
    }

    // Using unchecked_transaction because callers only hold &Connection.
    let transaction = connection.unchecked_transaction()?;

    (migration.apply)(&transaction)?;
    transaction.execute(
        "INSERT INTO schema_migration (version, description) VALUES (?1, ?2)",
        (migration.version, migration.description),
    )?;

    transaction.commit()?;

    tracing::info!(
        "Applied migration {}: {}",
        migration.version,
        migration.description
    );

    Ok(())
}

/// Read a timestamp stored as `YYYY-MM-DDTHH:MM:SS` from column `index`.
pub(crate) fn get_timestamp(row: &Row, index: usize) -> Result<Timestamp, rusqlite::Error> {
    let text: String = row.get(index)?;

    parse_stored_timestamp(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Read a decimal stored as text from column `index`.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}
