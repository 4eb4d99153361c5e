//! Ledger is a small bookkeeping web app for recording sales and expenses of
//! local businesses.
//!
//! This library provides a JSON API over a single SQLite ledger of records,
//! a streamed CSV export of filtered records, and the HTML shell page for the
//! browser front-end.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::{Deserialize, Serialize};
use tokio::signal;

mod app_state;
mod category;
mod database_id;
mod db;
mod demo_data;
mod endpoints;
mod html;
mod index_page;
mod logging;
mod record;
mod routing;
mod timestamp;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::{Category, CategoryName};
pub use database_id::{CategoryId, DatabaseId, RecordId};
pub use db::{initialize as initialize_db, seed_demo_data};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use record::{Record, RecordFilter, RecordQuery, RecordRow, escape_csv_field};
pub use routing::build_router;
pub use timestamp::{Timestamp, format_timestamp, parse_timestamp};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used as the source of a record.
    #[error("Source is required")]
    EmptySource,

    /// An empty string was used to create a category name.
    #[error("Category name is required")]
    EmptyCategoryName,

    /// A timestamp in a request body could not be parsed.
    #[error("\"{0}\" is not a valid timestamp")]
    InvalidTimestamp(String),

    /// A category with the same name, ignoring case and surrounding
    /// whitespace, already exists.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The category cannot be deleted while records refer to it.
    #[error("the category {0} is still used by one or more records")]
    CategoryInUse(CategoryId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a record that does not exist
    #[error("tried to update a record that is not in the database")]
    UpdateMissingRecord,

    /// Tried to delete a record that does not exist
    #[error("tried to delete a record that is not in the database")]
    DeleteMissingRecord,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The CSV export worker exited before producing any output.
    #[error("the export worker stopped before writing the CSV header")]
    ExportWorkerStopped,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// A human readable description of what went wrong.
    pub error: String,
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptySource | Error::EmptyCategoryName | Error::InvalidTimestamp(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound
            | Error::UpdateMissingRecord
            | Error::DeleteMissingRecord
            | Error::DeleteMissingCategory => StatusCode::NOT_FOUND,
            Error::DuplicateCategoryName(_) | Error::CategoryInUse(_) => StatusCode::CONFLICT,
            Error::SqlError(_) | Error::DatabaseLockError | Error::ExportWorkerStopped => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code.is_server_error() {
            // Server errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        Error, ErrorResponse,
        test_utils::{assert_content_type, response_json},
    };

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let response = Error::EmptySource.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_content_type(&response, "application/json");
        let body: ErrorResponse = response_json(response).await;
        assert_eq!(body.error, "Source is required");
    }

    #[tokio::test]
    async fn duplicate_category_is_a_conflict() {
        let response = Error::DuplicateCategoryName("Produto".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        assert_eq!(
            Error::DeleteMissingRecord.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::UpdateMissingRecord.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = response_json(response).await;
        assert!(!body.error.contains("lock"), "got {:?}", body.error);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
