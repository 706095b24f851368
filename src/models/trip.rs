use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{TravelMode, TripFrequency, TripPurpose};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A trip that passed validation but has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub mode: TravelMode,
    pub distance: f64,
    pub purpose: TripPurpose,
    pub companions: u32,
    pub frequency: TripFrequency,
    pub cost: f64,
}

impl TripDetails {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// A stored trip. `id` and `trip_number` are assigned by the repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub trip_number: i64,
    #[serde(flatten)]
    pub details: TripDetails,
}

impl Trip {
    pub fn new(id: Uuid, trip_number: i64, details: TripDetails) -> Self {
        Self {
            id,
            trip_number,
            details,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.details.start_time
    }

    pub fn mode(&self) -> TravelMode {
        self.details.mode
    }

    pub fn purpose(&self) -> TripPurpose {
        self.details.purpose
    }
}
