use axum::{middleware::from_fn, routing::get, Router};
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index},
    auth::{login_handler, login_page, logout_handler},
    dashboard::dashboard_handler,
    metrics::metrics,
    products::{
        create_product, edit_product_page, list_products, new_product_page, show_product,
        update_product,
    },
};
use crate::middleware::route_guard;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Durable per-client session records backing the Session Store
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.session_cookie.secure)
        .with_expiry(Expiry::OnInactivity(state.session_cookie.max_age));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .route("/dashboard", get(dashboard_handler))
        .route(
            "/dashboard/products",
            get(list_products).post(create_product),
        )
        .route("/dashboard/products/new", get(new_product_page))
        .route(
            "/dashboard/products/:id",
            get(show_product).post(update_product),
        )
        .route("/dashboard/products/:id/edit", get(edit_product_page))
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(from_fn(route_guard))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost, so the trace span sees the request id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
