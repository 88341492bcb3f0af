//! Cross-Origin Resource Sharing policy for the API.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer that lets the configured front end origins call the API.
///
/// Origins that are not valid header values are logged and skipped.
/// Credentials are allowed, so a wildcard origin is never used.
pub fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Ignoring invalid CORS origin {origin:?}: {error}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        http::{HeaderValue, StatusCode, header},
        routing::get,
    };
    use axum_test::TestServer;

    use super::build_cors_layer;

    fn server_with_origins(origins: &[&str]) -> TestServer {
        let origins: Vec<String> = origins.iter().map(|origin| origin.to_string()).collect();
        let app = Router::new()
            .route("/", get(|| async { "hello" }))
            .layer(build_cors_layer(&origins));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn allows_listed_origin() {
        let server = server_with_origins(&["http://localhost:19006"]);

        let response = server
            .get("/")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://localhost:19006"),
            )
            .await;

        response.assert_status(StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:19006"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn omits_header_for_unlisted_origin() {
        let server = server_with_origins(&["http://localhost:19006", "not a\nvalid origin"]);

        let response = server
            .get("/")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("https://evil.example.com"),
            )
            .await;

        response.assert_status(StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
