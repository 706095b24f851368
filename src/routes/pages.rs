use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::AppError,
    models::{
        catalog::{TravelMode, TripFrequency, TripPurpose},
        draft::{CoordinateInput, NumericInput, TripDraft},
        trip::Trip,
    },
    services::{
        filter::TripFilter,
        validation::{self, FieldErrors, TripField},
    },
    state::AppState,
    time::format_local,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/trips") }))
        .route("/trips", get(trips_list))
        .route("/trips/new", get(trip_new_form).post(trip_new_submit))
}

#[derive(Clone)]
struct SelectOption {
    value: &'static str,
    selected: bool,
}

fn options<T>(all: &[T], label: fn(&T) -> &'static str, current: &str) -> Vec<SelectOption> {
    all.iter()
        .map(|item| {
            let value = label(item);
            SelectOption {
                value,
                selected: value == current,
            }
        })
        .collect()
}

#[derive(Clone)]
struct TripSummary {
    trip_number: i64,
    mode: String,
    purpose: String,
    frequency: String,
    start: String,
    end: String,
    duration_minutes: i64,
    origin: String,
    destination: String,
    distance: String,
    companions: u32,
    cost: String,
}

impl From<Trip> for TripSummary {
    fn from(trip: Trip) -> Self {
        let details = trip.details;
        Self {
            trip_number: trip.trip_number,
            mode: details.mode.to_string(),
            purpose: details.purpose.to_string(),
            frequency: details.frequency.to_string(),
            start: format_local(details.start_time),
            end: format_local(details.end_time),
            duration_minutes: details.duration_minutes(),
            origin: format!("{:.4}, {:.4}", details.origin.lat, details.origin.lon),
            destination: format!(
                "{:.4}, {:.4}",
                details.destination.lat, details.destination.lon
            ),
            distance: format!("{:.1}", details.distance),
            companions: details.companions,
            cost: format!("{:.2}", details.cost),
        }
    }
}

#[derive(Template)]
#[template(path = "trips/list.html")]
struct TripsListTemplate {
    modes: Vec<SelectOption>,
    purposes: Vec<SelectOption>,
    start_date: String,
    end_date: String,
    notice: String,
    trip_count: usize,
    trips: Vec<TripSummary>,
}

impl TripsListTemplate {
    fn new(filter: &TripFilter, trips: Vec<Trip>, notice: String) -> Self {
        let mode = filter.mode.map(|m| m.as_str()).unwrap_or_default();
        let purpose = filter.purpose.map(|p| p.as_str()).unwrap_or_default();
        Self {
            modes: options(&TravelMode::ALL, TravelMode::as_str, mode),
            purposes: options(&TripPurpose::ALL, TripPurpose::as_str, purpose),
            start_date: filter.start_date.map(|d| d.to_string()).unwrap_or_default(),
            end_date: filter.end_date.map(|d| d.to_string()).unwrap_or_default(),
            notice,
            trip_count: trips.len(),
            trips: trips.into_iter().map(TripSummary::from).collect(),
        }
    }
}

/// A filter the page cannot read falls back to listing everything, with a
/// notice instead of an error body.
async fn trips_list(
    State(state): State<AppState>,
    query: Result<Query<TripFilter>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (filter, notice) = match query {
        Ok(Query(filter)) => (filter, String::new()),
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "ignoring unreadable trip filter");
            (
                TripFilter::default(),
                "Some filters could not be read and were reset.".to_string(),
            )
        }
    };
    let trips = state.trips.list(&filter).await?;
    Ok(AskamaTemplateResponse::into_response(TripsListTemplate::new(
        &filter, trips, notice,
    )))
}

/// One message slot per input; empty when the field is fine.
#[derive(Clone, Default)]
struct FieldMessages {
    origin: String,
    destination: String,
    start_time: String,
    end_time: String,
    distance: String,
    companions: String,
    cost: String,
    mode: String,
    purpose: String,
    frequency: String,
}

impl From<&FieldErrors> for FieldMessages {
    fn from(errors: &FieldErrors) -> Self {
        let text = |field| errors.get(field).unwrap_or_default().to_string();
        Self {
            origin: text(TripField::Origin),
            destination: text(TripField::Destination),
            start_time: text(TripField::StartTime),
            end_time: text(TripField::EndTime),
            distance: text(TripField::Distance),
            companions: text(TripField::Companions),
            cost: text(TripField::Cost),
            mode: text(TripField::Mode),
            purpose: text(TripField::Purpose),
            frequency: text(TripField::Frequency),
        }
    }
}

#[derive(Template)]
#[template(path = "trips/new.html")]
struct TripNewTemplate {
    form: TripForm,
    errors: FieldMessages,
    error_summary: String,
    modes: Vec<SelectOption>,
    purposes: Vec<SelectOption>,
    frequencies: Vec<SelectOption>,
}

impl TripNewTemplate {
    fn new(form: TripForm, errors: &FieldErrors) -> Self {
        let modes = options(&TravelMode::ALL, TravelMode::as_str, &form.mode);
        let purposes = options(&TripPurpose::ALL, TripPurpose::as_str, &form.purpose);
        let frequencies = options(&TripFrequency::ALL, TripFrequency::as_str, &form.frequency);
        Self {
            errors: FieldMessages::from(errors),
            error_summary: errors.summary(),
            form,
            modes,
            purposes,
            frequencies,
        }
    }
}

/// Flat form fields as posted by the entry page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TripForm {
    origin_lat: NumericInput,
    origin_lon: NumericInput,
    destination_lat: NumericInput,
    destination_lon: NumericInput,
    start_time: String,
    end_time: String,
    mode: String,
    distance: NumericInput,
    purpose: String,
    companions: NumericInput,
    frequency: String,
    cost: NumericInput,
}

impl TripForm {
    fn from_draft(draft: TripDraft) -> Self {
        let origin = draft.origin.unwrap_or_default();
        let destination = draft.destination.unwrap_or_default();
        Self {
            origin_lat: origin.lat,
            origin_lon: origin.lon,
            destination_lat: destination.lat,
            destination_lon: destination.lon,
            start_time: draft.start_time.unwrap_or_default(),
            end_time: draft.end_time.unwrap_or_default(),
            mode: draft.mode.unwrap_or_default(),
            distance: draft.distance,
            purpose: draft.purpose.unwrap_or_default(),
            companions: draft.companions,
            frequency: draft.frequency.unwrap_or_default(),
            cost: draft.cost,
        }
    }

    fn to_draft(&self) -> TripDraft {
        TripDraft {
            origin: Some(CoordinateInput::new(
                self.origin_lat.clone(),
                self.origin_lon.clone(),
            )),
            destination: Some(CoordinateInput::new(
                self.destination_lat.clone(),
                self.destination_lon.clone(),
            )),
            start_time: non_empty(&self.start_time),
            end_time: non_empty(&self.end_time),
            mode: non_empty(&self.mode),
            distance: self.distance.clone(),
            purpose: non_empty(&self.purpose),
            companions: self.companions.clone(),
            frequency: non_empty(&self.frequency),
            cost: self.cost.clone(),
        }
    }
}

async fn trip_new_form() -> impl IntoResponse {
    let form = TripForm::from_draft(TripDraft::form_defaults());
    AskamaTemplateResponse::into_response(TripNewTemplate::new(form, &FieldErrors::new()))
}

async fn trip_new_submit(
    State(state): State<AppState>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    match validation::validate(&form.to_draft()) {
        Ok(details) => {
            state.trips.create(details).await?;
            Ok(Redirect::to("/trips").into_response())
        }
        Err(errors) => {
            debug!(%errors, "trip form rejected");
            Ok((
                StatusCode::BAD_REQUEST,
                AskamaTemplateResponse::into_response(TripNewTemplate::new(form, &errors)),
            )
                .into_response())
        }
    }
}

fn non_empty(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
