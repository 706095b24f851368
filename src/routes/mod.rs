pub mod api;
pub mod pages;

use axum::{http::HeaderValue, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_allow_origin.as_deref());
    Router::new()
        .merge(pages::router())
        .nest("/api/trips", api::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(err)) => {
            warn!("ignoring invalid CORS_ALLOW_ORIGIN: {err}");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
