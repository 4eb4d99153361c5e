use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState, Error, app_state::lock_connection, database_id::RecordId, record::delete_record,
};

/// A route handler for deleting a record.
///
/// Responds with `204 No Content`, or `404 Not Found` if the record does not
/// exist.
pub async fn delete_record_endpoint(
    State(state): State<AppState>,
    Path(record_id): Path<RecordId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_record(record_id, &connection)?;
    tracing::info!("Deleted record {record_id}");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::delete};
    use axum_test::TestServer;

    use crate::{
        AppState, Error, ErrorResponse,
        category::CategoryName,
        endpoints::{self, format_endpoint},
        record::{NewRecord, count_records, create_record, delete_record_endpoint, get_record},
        test_utils::must_create_test_state,
    };

    fn get_test_server(state: &AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::RECORD, delete(delete_record_endpoint))
            .with_state(state.clone());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn deletes_record() {
        let state = must_create_test_state();
        let record = create_record(
            NewRecord::build("Academia Adrena", CategoryName::new_unchecked("Serviço")),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        let server = get_test_server(&state);

        server
            .delete(&format_endpoint(endpoints::RECORD, record.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_record(record.id, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn missing_record_is_not_found_without_side_effect() {
        let state = must_create_test_state();
        create_record(
            NewRecord::build("Academia Adrena", CategoryName::new_unchecked("Serviço")),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        let server = get_test_server(&state);

        let response = server.delete(&format_endpoint(endpoints::RECORD, 999)).await;

        response.assert_status(StatusCode::NOT_FOUND);
        let _: ErrorResponse = response.json();
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_records(&connection), Ok(1));
    }
}
