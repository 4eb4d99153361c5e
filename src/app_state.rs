//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error,
    db::{initialize, open_connection, seed_demo_data},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
    /// The file path or `file:` URI of the database, used to open read-only
    /// connections for long running reads.
    pub db_path: Arc<str>,
}

impl AppState {
    /// Create a new [AppState] connected to the SQLite database at `db_path`.
    ///
    /// This function will initialize the database by applying any pending
    /// migrations. If `load_demo_data` is true, the demo records are added to
    /// an empty ledger.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: &str, load_demo_data: bool) -> Result<Self, Error> {
        let db_connection = open_connection(db_path)?;
        initialize(&db_connection)?;

        if load_demo_data {
            seed_demo_data(&db_connection)?;
        }

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            db_path: Arc::from(db_path),
        })
    }
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock has been poisoned.
pub(crate) fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
