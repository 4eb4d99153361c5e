//! Streams the filtered records as a CSV download.

use std::ops::ControlFlow;

use axum::{
    body::Body,
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use futures::{StreamExt, stream};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::{
    AppState, Error,
    db::open_read_connection,
    record::{
        CSV_HEADER, RecordFilter, RecordQuery, export::format_csv_row, query::RecordRowsQuery,
    },
};

/// How many CSV lines may wait for the client before the export worker
/// blocks.
const EXPORT_CHANNEL_CAPACITY: usize = 64;

type CsvLine = Result<String, Error>;

/// How an export worker finished.
#[derive(Debug, PartialEq)]
enum ExportOutcome {
    /// Every matching record was sent.
    Finished { rows: usize },
    /// The receiving end was dropped, usually because the client went away.
    ClientDisconnected,
    /// The query failed and the error was handed to the receiver.
    Failed,
}

/// A route handler that downloads the records matching the query string as
/// a CSV file.
///
/// Uses the same filter and ordering as the record list. The body is written
/// one line at a time while the database cursor is walked, so the document
/// is never held in memory. The cursor runs on its own read-only connection,
/// so a slow download does not hold up other requests.
pub async fn export_records_endpoint(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Response, Error> {
    let filter = RecordFilter::from_query(&query);
    let (sender, mut receiver) = mpsc::channel(EXPORT_CHANNEL_CAPACITY);
    let db_path = state.db_path.clone();

    tokio::task::spawn_blocking(move || write_csv_lines(&db_path, &filter, sender));

    // Errors before the header can still be reported with a status code.
    let header = match receiver.recv().await {
        Some(Ok(header)) => header,
        Some(Err(error)) => return Err(error),
        None => return Err(Error::ExportWorkerStopped),
    };

    let body = Body::from_stream(
        stream::once(async move { Ok::<_, Error>(header) }).chain(receive_lines(receiver)),
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=registros.csv"),
        ],
        body,
    )
        .into_response())
}

fn receive_lines(receiver: Receiver<CsvLine>) -> impl futures::Stream<Item = CsvLine> {
    stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|line| (line, receiver))
    })
}

/// Query the records matching `filter` in the database at `db_path` and send
/// the CSV header followed by one line per record.
///
/// Keeps a read-only connection open until it returns. Must be called from a
/// blocking context, not from an async task.
fn write_csv_lines(db_path: &str, filter: &RecordFilter, sender: Sender<CsvLine>) -> ExportOutcome {
    let connection = match open_read_connection(db_path) {
        Ok(connection) => connection,
        Err(error) => return send_error(&sender, error),
    };

    let mut query = match RecordRowsQuery::prepare(filter, &connection) {
        Ok(query) => query,
        Err(error) => return send_error(&sender, error),
    };

    if sender.blocking_send(Ok(CSV_HEADER.to_owned())).is_err() {
        tracing::debug!("CSV export cancelled before the header was sent.");
        return ExportOutcome::ClientDisconnected;
    }

    let mut rows = 0;
    let mut disconnected = false;

    let result = query.for_each(|row| {
        if sender.blocking_send(Ok(format_csv_row(&row))).is_err() {
            disconnected = true;
            return ControlFlow::Break(());
        }

        rows += 1;
        ControlFlow::Continue(())
    });

    match result {
        Ok(()) if disconnected => {
            tracing::debug!("CSV export cancelled by the client after {rows} rows.");
            ExportOutcome::ClientDisconnected
        }
        Ok(()) => {
            tracing::debug!("CSV export finished with {rows} rows.");
            ExportOutcome::Finished { rows }
        }
        Err(error) => {
            tracing::error!("CSV export failed after {rows} rows: {error}");
            send_error(&sender, error)
        }
    }
}

fn send_error(sender: &Sender<CsvLine>, error: Error) -> ExportOutcome {
    if sender.blocking_send(Err(error)).is_err() {
        return ExportOutcome::ClientDisconnected;
    }

    ExportOutcome::Failed
}


#[cfg(test)]
mod endpoint_tests {
    use std::{sync::mpsc, thread, time::Duration};

    use axum::{
        Json, Router,
        body::to_bytes,
        extract::{Query, State},
        routing::get,
    };
    use axum_test::TestServer;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        AppState,
        category::CategoryName,
        endpoints,
        record::{
            CSV_HEADER, NewRecord, RecordQuery, create_record, export_records_endpoint,
            list_records_endpoint,
        },
        test_utils::must_create_test_state,
    };

    fn get_test_server(state: &AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::RECORDS_EXPORT, get(export_records_endpoint))
            .with_state(state.clone());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn insert_records(state: &AppState) {
        let connection = state.db_connection.lock().unwrap();

        create_record(
            NewRecord::build("Academia Adrena", CategoryName::new_unchecked("Mensalidade"))
                .timestamp(datetime!(2024-01-15 08:00:00))
                .amount(Decimal::new(11990, 2))
                .notes(Some("Plano \"anual\", pago à vista")),
            &connection,
        )
        .unwrap();
        create_record(
            NewRecord::build("Lanchonete da Cau", CategoryName::new_unchecked("Alimentação"))
                .timestamp(datetime!(2024-02-01 12:00:00))
                .amount(Decimal::new(2850, 2)),
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn export_sets_download_headers() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let response = server.get(endpoints::RECORDS_EXPORT).await;

        response.assert_status_ok();
        assert_eq!(
            response.header("content-type"),
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=registros.csv"
        );
    }

    #[tokio::test]
    async fn export_with_no_matches_is_only_header() {
        let state = must_create_test_state();
        insert_records(&state);
        let server = get_test_server(&state);

        let response = server
            .get(endpoints::RECORDS_EXPORT)
            .add_query_param("source", "no such place")
            .await;

        assert_eq!(response.text(), CSV_HEADER);
    }

    #[tokio::test]
    async fn export_uses_list_order_and_filters() {
        let state = must_create_test_state();
        insert_records(&state);
        let server = get_test_server(&state);

        let all = server.get(endpoints::RECORDS_EXPORT).await.text();
        let january = server
            .get(endpoints::RECORDS_EXPORT)
            .add_query_param("from", "2024-01-01")
            .add_query_param("to", "2024-01-31")
            .await
            .text();

        assert_eq!(
            all,
            "Id,Timestamp,Source,Category,Amount,Notes\n\
             2,2024-02-01T12:00:00,Lanchonete da Cau,Alimentação,28.50,\n\
             1,2024-01-15T08:00:00,Academia Adrena,Mensalidade,119.90,\"Plano \"\"anual\"\", pago à vista\"\n"
        );
        assert_eq!(
            january,
            "Id,Timestamp,Source,Category,Amount,Notes\n\
             1,2024-01-15T08:00:00,Academia Adrena,Mensalidade,119.90,\"Plano \"\"anual\"\", pago à vista\"\n"
        );
    }

    #[tokio::test]
    async fn exported_notes_survive_a_csv_parser() {
        let state = must_create_test_state();
        insert_records(&state);
        let server = get_test_server(&state);

        let document = server
            .get(endpoints::RECORDS_EXPORT)
            .add_query_param("category", "mensal")
            .await
            .text();

        let mut reader = csv::Reader::from_reader(document.as_bytes());
        let notes: Vec<String> = reader
            .records()
            .map(|record| record.expect("Could not parse CSV")[5].to_owned())
            .collect();
        assert_eq!(notes, vec!["Plano \"anual\", pago à vista".to_owned()]);
    }

    #[test]
    fn other_requests_are_served_during_an_export() {
        let state = must_create_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            for minute in 0..500 {
                create_record(
                    NewRecord::build("Lanchonete da Cau", CategoryName::new_unchecked("Alimentação"))
                        .timestamp(datetime!(2024-01-01 00:00:00) + time::Duration::minutes(minute))
                        .amount(Decimal::new(1250, 2)),
                    &connection,
                )
                .unwrap();
            }
        }
        let (done_sender, done_receiver) = mpsc::channel();

        // A single worker thread, so a request blocked on the database would
        // stop the export body from ever being polled.
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let response =
                    export_records_endpoint(State(state.clone()), Query(RecordQuery::default()))
                        .await
                        .unwrap();
                let list = tokio::spawn(list_records_endpoint(
                    State(state.clone()),
                    Query(RecordQuery::default()),
                ));
                let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
                let Json(rows) = list.await.unwrap().unwrap();

                let document = String::from_utf8(body.to_vec()).unwrap();
                done_sender.send((document.lines().count(), rows.len())).unwrap();
            });
        });

        let (csv_lines, listed) = done_receiver
            .recv_timeout(Duration::from_secs(10))
            .expect("The export and the list did not both finish");

        assert_eq!(csv_lines, 501);
        assert_eq!(listed, 500);
    }
}
