use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    database_id::RecordId,
    record::{RecordChanges, UpdateRecordRequest, update_record},
};

/// A route handler for partially updating a record.
///
/// Fields missing from the body are left unchanged. Responds with `204 No
/// Content`, `404 Not Found` if the record does not exist, or `400 Bad
/// Request` if the timestamp cannot be parsed.
pub async fn edit_record_endpoint(
    State(state): State<AppState>,
    Path(record_id): Path<RecordId>,
    Json(request): Json<UpdateRecordRequest>,
) -> Result<StatusCode, Error> {
    let changes = RecordChanges::try_from(request)?;
    let connection = lock_connection(&state.db_connection)?;

    update_record(record_id, changes, &connection)?;
    tracing::info!("Updated record {record_id}");

    Ok(StatusCode::NO_CONTENT)
}
