mod admin;
mod department;
mod students;


use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::security_headers;
use crate::state::AppState;

/// Headroom for multipart framing and the other form fields around a photo.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(admin::login))
        .route("/students/register", post(students::register))
        .route("/students/status", post(students::status))
        .route(
            "/students/photo",
            post(students::upload_photo).get(students::photo_lookup),
        )
        .route(
            "/department/{department}",
            get(department::list).put(department::update_documents),
        )
}

/// The complete application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.photo.max_bytes + MULTIPART_OVERHEAD;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let router = Router::new().nest("/api", api_router());

    let router = if state.config.tls_enabled() {
        router.layer(from_fn(security_headers::security_headers_with_hsts))
    } else {
        router.layer(from_fn(security_headers::security_headers))
    };

    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
