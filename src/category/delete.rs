use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState, Error, app_state::lock_connection, category::delete_category,
    database_id::CategoryId,
};

/// A route handler for deleting a category that no record refers to.
pub async fn delete_category_endpoint(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_category(category_id, &connection)?;
    tracing::info!("Deleted category {category_id}");

    Ok(StatusCode::NO_CONTENT)
}
