//! Application router configuration.

use std::path::Path;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::{
    AppState, ErrorResponse,
    category::{create_category_endpoint, delete_category_endpoint, list_categories_endpoint},
    endpoints,
    index_page::get_index_page,
    record::{
        create_record_endpoint, delete_record_endpoint, edit_record_endpoint,
        export_records_endpoint, list_records_endpoint,
    },
    timestamp::{format_timestamp, now_utc},
};

/// Return a router with all the app's routes.
///
/// Static files are served from `static_dir`. The JSON API allows requests
/// from any origin so that the front-end can also be served separately.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(
            endpoints::RECORDS,
            get(list_records_endpoint).post(create_record_endpoint),
        )
        // The static export path takes priority over the record ID parameter.
        .route(endpoints::RECORDS_EXPORT, get(export_records_endpoint))
        .route(
            endpoints::RECORD,
            put(edit_record_endpoint).delete(delete_record_endpoint),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::HEALTH, get(get_health))
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new(static_dir))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The body of the health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    /// Always "ok" while the server is accepting requests.
    pub status: String,
    /// The server's current UTC time.
    pub timestamp: String,
}

async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok".to_owned(),
        timestamp: format_timestamp(now_utc()),
    })
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "the requested resource could not be found".to_owned(),
        }),
    )
        .into_response()
}
