use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{catalog::TripOptions, draft::TripDraft, trip::Trip},
    services::{
        filter::TripFilter,
        validation::{self, Profile},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/validate", post(precheck_trip))
        .route("/options", get(trip_options))
        .route("/:id", get(trip_detail))
}

async fn list_trips(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TripFilter>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let trips = state.trips.list(&filter).await?;
    debug!(count = trips.len(), ?filter, "listed trips");
    Ok(Json(trips))
}

async fn create_trip(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<TripDraft>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let details = validation::validate(&draft).map_err(|errors| {
        debug!(%errors, "trip rejected");
        errors
    })?;
    let trip = state.trips.create(details).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// Dry run for the entry form. Nothing is stored.
async fn precheck_trip(ApiJson(draft): ApiJson<TripDraft>) -> Result<Json<Value>, AppError> {
    let errors = validation::check(&draft, Profile::Interactive);
    if errors.is_empty() {
        Ok(Json(json!({ "valid": true })))
    } else {
        Err(errors.into())
    }
}

async fn trip_options() -> Json<TripOptions> {
    Json(TripOptions::all())
}

async fn trip_detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.trips.find(id).await?))
}
