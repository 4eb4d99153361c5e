use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    record::{RecordFilter, RecordQuery, RecordRow, get_record_rows},
};

/// A route handler that lists the records matching the query string, newest
/// first.
///
/// Filter values that cannot be parsed are ignored.
pub async fn list_records_endpoint(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<Vec<RecordRow>>, Error> {
    let filter = RecordFilter::from_query(&query);
    let connection = lock_connection(&state.db_connection)?;

    get_record_rows(&filter, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        AppState,
        category::CategoryName,
        endpoints,
        record::{NewRecord, RecordRow, create_record, list_records_endpoint},
        test_utils::must_create_test_state,
    };

    fn get_test_server(state: &AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::RECORDS, get(list_records_endpoint))
            .with_state(state.clone());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn insert_records(state: &AppState) {
        let connection = state.db_connection.lock().unwrap();

        for (timestamp, source, category) in [
            (datetime!(2024-01-10 12:00:00), "Lanchonete da Cau", "Alimentação"),
            (datetime!(2024-01-31 00:00:00), "Academia Adrena", "Mensalidade"),
            (datetime!(2024-02-01 00:00:00), "Lanchonete da Cau", "Alimentação"),
        ] {
            create_record(
                NewRecord::build(source, CategoryName::new_unchecked(category))
                    .timestamp(timestamp)
                    .amount(Decimal::new(2000, 2)),
                &connection,
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn lists_all_records_newest_first() {
        let state = must_create_test_state();
        insert_records(&state);
        let server = get_test_server(&state);

        let response = server.get(endpoints::RECORDS).await;

        response.assert_status_ok();
        let rows: Vec<RecordRow> = response.json();
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(rows[1].category.as_deref(), Some("Mensalidade"));
        assert_eq!(rows[1].amount.to_string(), "20.00");
    }

    #[tokio::test]
    async fn filters_by_date_range() {
        let state = must_create_test_state();
        insert_records(&state);
        let server = get_test_server(&state);

        let response = server
            .get(endpoints::RECORDS)
            .add_query_param("from", "2024-01-01")
            .add_query_param("to", "2024-01-31")
            .await;

        let rows: Vec<RecordRow> = response.json();
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn filters_by_source_ignoring_case() {
        let state = must_create_test_state();
        insert_records(&state);
        let server = get_test_server(&state);

        let response = server
            .get(endpoints::RECORDS)
            .add_query_param("source", "lanchonete")
            .await;

        let rows: Vec<RecordRow> = response.json();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.source == "Lanchonete da Cau"));
    }

    #[tokio::test]
    async fn ignores_unparseable_filters() {
        let state = must_create_test_state();
        insert_records(&state);
        let server = get_test_server(&state);

        let response = server
            .get(endpoints::RECORDS)
            .add_query_param("from", "last tuesday")
            .add_query_param("to", "")
            .await;

        response.assert_status_ok();
        let rows: Vec<RecordRow> = response.json();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn empty_ledger_gives_empty_list() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let rows: Vec<RecordRow> = server.get(endpoints::RECORDS).await.json();

        assert_eq!(rows, vec![]);
    }
}
