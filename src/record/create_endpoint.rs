use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::RecordId,
    endpoints::{self, format_endpoint},
    record::{CreateRecordRequest, NewRecord, create_record},
};

/// The response body for a newly created record.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct CreatedRecord {
    /// The ID assigned to the record.
    pub id: RecordId,
}

/// A route handler for creating a record.
///
/// The category is looked up by name ignoring case and created if it does
/// not exist. Responds with `201 Created` and the new ID, or `400 Bad
/// Request` when the source or category name is blank or the timestamp
/// cannot be parsed.
pub async fn create_record_endpoint(
    State(state): State<AppState>,
    Json(request): Json<CreateRecordRequest>,
) -> Result<Response, Error> {
    let new_record = NewRecord::try_from(request)?;
    let connection = lock_connection(&state.db_connection)?;

    let record = create_record(new_record, &connection)?;
    tracing::info!("Created record {} for \"{}\"", record.id, record.source);

    let location = format_endpoint(endpoints::RECORD, record.id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(CreatedRecord { id: record.id }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rust_decimal::Decimal;
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        AppState, ErrorResponse,
        category::{count_categories, get_category},
        endpoints,
        record::{count_records, create_endpoint::CreatedRecord, create_record_endpoint, get_record},
        test_utils::must_create_test_state,
    };

    fn get_test_server(state: &AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::RECORDS, post(create_record_endpoint))
            .with_state(state.clone());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_record_with_new_category() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::RECORDS)
            .json(&json!({
                "timestamp": "2024-01-15T08:00:00",
                "source": " Academia Adrena ",
                "categoryName": "Mensalidade",
                "amount": 119.90,
                "notes": "Mensalidade - João Silva",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created: CreatedRecord = response.json();
        assert_eq!(response.header("location"), "/api/records/1");

        let connection = state.db_connection.lock().unwrap();
        let record = get_record(created.id, &connection).unwrap();
        assert_eq!(record.source, "Academia Adrena");
        assert_eq!(record.amount, Decimal::new(11990, 2));
        assert_eq!(record.timestamp, datetime!(2024-01-15 08:00:00));
        assert_eq!(count_categories(&connection), Ok(1));
        let category = get_category(record.category_id, &connection).unwrap();
        assert_eq!(category.name.as_ref(), "Mensalidade");
    }

    #[tokio::test]
    async fn create_record_reuses_category_ignoring_case() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        for category_name in ["Produto", "produto", " PRODUTO "] {
            server
                .post(endpoints::RECORDS)
                .json(&json!({
                    "source": "Armarinho Eliana",
                    "categoryName": category_name,
                    "amount": "12.00",
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_records(&connection), Ok(3));
        assert_eq!(count_categories(&connection), Ok(1));
    }

    #[tokio::test]
    async fn blank_source_is_rejected_without_insert() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::RECORDS)
            .json(&json!({
                "source": "   ",
                "categoryName": "Produto",
                "amount": 10,
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "Source is required");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_records(&connection), Ok(0));
        assert_eq!(count_categories(&connection), Ok(0));
    }

    #[tokio::test]
    async fn blank_category_is_rejected() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::RECORDS)
            .json(&json!({"source": "Lanchonete da Cau", "amount": 10}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "Category name is required");
    }

    #[tokio::test]
    async fn unparseable_timestamp_is_rejected() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::RECORDS)
            .json(&json!({
                "timestamp": "15/01/2024",
                "source": "Lanchonete da Cau",
                "categoryName": "Alimentação",
                "amount": 10,
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_records(&connection), Ok(0));
    }
}
