//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Request bodies longer than this many bytes are truncated at the `info`
/// level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// The request and its body are logged at the `info` level. If the request
/// body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated and the
/// full body is logged at the `debug` level.
///
/// Only the status and headers of the response are logged. Response bodies
/// may be streamed, e.g. the CSV export, and must not be buffered here.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    log_request(&parts, &String::from_utf8_lossy(&body_bytes));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    log_response(&parts);

    Response::from_parts(parts, body)
}

/// Cut `text` to at most `limit` bytes without splitting a character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {parts:#?}\nbody: {:}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &response::Parts) {
    tracing::info!("Sending response: {parts:#?}");
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, middleware, routing::post};
    use axum_test::TestServer;
    use futures::stream;

    use super::{logging_middleware, truncate};

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 8), "abc");
        assert_eq!(truncate("abcdef", 3), "abc");
        // 'ç' takes two bytes.
        assert_eq!(truncate("Serviço", 6), "Servi");
    }

    #[tokio::test]
    async fn passes_request_body_through() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.post("/echo").text("a".repeat(200)).await;

        response.assert_status_ok();
        assert_eq!(response.text(), "a".repeat(200));
    }

    #[tokio::test]
    async fn passes_streamed_response_through() {
        let app = Router::new()
            .route(
                "/stream",
                post(|| async {
                    Body::from_stream(stream::iter(
                        ["a,b\n", "c,d\n"].map(Ok::<_, std::io::Error>),
                    ))
                }),
            )
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.post("/stream").await;

        assert_eq!(response.text(), "a,b\nc,d\n");
    }
}
