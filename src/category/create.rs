//! Endpoint for creating categories.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    category::{CategoryName, create_category, domain::CreateCategoryRequest},
    endpoints::{self, format_endpoint},
};

/// A route handler for creating a category.
///
/// Responds with `201 Created` and the new category, `400 Bad Request` if the
/// name is blank, or `409 Conflict` if the name is already taken.
pub async fn create_category_endpoint(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&request.name)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(name, &connection)?;
    tracing::info!("Created category {} \"{}\"", category.id, category.name);

    let location = format_endpoint(endpoints::CATEGORY, category.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(category)).into_response())
}
