use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::Connection;

use crate::{AppState, db::initialize};

static TEST_DATABASE_COUNT: AtomicUsize = AtomicUsize::new(0);

/// An in-memory database with every migration applied and no demo data.
#[track_caller]
pub(crate) fn must_create_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// App state backed by a named in-memory database that read connections can
/// open too. The database lives as long as the state.
#[track_caller]
pub(crate) fn must_create_test_state() -> AppState {
    let db_path = format!(
        "file:ledger-test-{}?mode=memory&cache=shared",
        TEST_DATABASE_COUNT.fetch_add(1, Ordering::Relaxed)
    );

    AppState::new(&db_path, false).expect("Could not create app state")
}
