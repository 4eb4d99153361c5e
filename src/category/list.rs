//! Endpoint for listing categories.

use axum::{Json, extract::State};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    category::{Category, get_all_categories},
};

/// A route handler that responds with every category as JSON, ordered by name.
pub async fn list_categories_endpoint(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_categories(&connection).map(Json)
}
