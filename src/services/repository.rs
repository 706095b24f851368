use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::info;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::trip::{Coordinates, Trip, TripDetails},
    services::filter::TripFilter,
    time,
};

const TRIP_COLUMNS: &str = "id, trip_number, origin_lat, origin_lon, destination_lat, \
     destination_lon, start_time, end_time, mode, distance, purpose, companions, frequency, cost";

#[derive(Clone)]
pub struct TripRepository {
    db: DbPool,
}

impl TripRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Stores a validated trip. The trip number is drawn from the sequence
    /// row inside the same transaction as the insert.
    pub async fn create(&self, details: TripDetails) -> Result<Trip, AppError> {
        let mut tx = self.db.begin().await?;

        let trip_number: i64 = sqlx::query_scalar(
            "UPDATE trip_sequence SET last_value = last_value + 1 WHERE id = 1 RETURNING last_value",
        )
        .fetch_one(&mut *tx)
        .await?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO trips (id, trip_number, origin_lat, origin_lon, destination_lat,
                destination_lon, start_time, end_time, mode, distance, purpose, companions,
                frequency, cost, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#,
        )
        .bind(id.to_string())
        .bind(trip_number)
        .bind(details.origin.lat)
        .bind(details.origin.lon)
        .bind(details.destination.lat)
        .bind(details.destination.lon)
        .bind(time::to_storage(details.start_time))
        .bind(time::to_storage(details.end_time))
        .bind(details.mode.as_str())
        .bind(details.distance)
        .bind(details.purpose.as_str())
        .bind(i64::from(details.companions))
        .bind(details.frequency.as_str())
        .bind(details.cost)
        .bind(time::to_storage(Utc::now()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(%id, trip_number, mode = %details.mode, "trip stored");

        Ok(Trip::new(id, trip_number, details))
    }

    /// Trips matching `filter`, newest start time first.
    pub async fn list(&self, filter: &TripFilter) -> Result<Vec<Trip>, AppError> {
        let bounds = filter.time_bounds();
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {TRIP_COLUMNS} FROM trips WHERE 1 = 1"));
        if let Some(mode) = filter.mode {
            query.push(" AND mode = ").push_bind(mode.as_str());
        }
        if let Some(purpose) = filter.purpose {
            query.push(" AND purpose = ").push_bind(purpose.as_str());
        }
        if let Some(from) = bounds.from {
            query.push(" AND start_time >= ").push_bind(time::to_storage(from));
        }
        if let Some(to) = bounds.to {
            query.push(" AND start_time <= ").push_bind(time::to_storage(to));
        }
        query.push(" ORDER BY start_time DESC, trip_number DESC");

        let rows: Vec<TripRow> = query.build_query_as().fetch_all(&self.db).await?;
        rows.into_iter().map(Trip::try_from).collect()
    }

    pub async fn find(&self, id: Uuid) -> Result<Trip, AppError> {
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.db)
                .await?;
        row.ok_or(AppError::NotFound)?.try_into()
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trips")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

#[derive(Debug, FromRow)]
struct TripRow {
    id: String,
    trip_number: i64,
    origin_lat: f64,
    origin_lon: f64,
    destination_lat: f64,
    destination_lon: f64,
    start_time: String,
    end_time: String,
    mode: String,
    distance: f64,
    purpose: String,
    companions: i64,
    frequency: String,
    cost: f64,
}

impl TryFrom<TripRow> for Trip {
    type Error = AppError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| AppError::CorruptRecord {
            id: row.id.clone(),
            reason,
        };
        let id = Uuid::parse_str(&row.id).map_err(|err| corrupt(err.to_string()))?;
        let start_time =
            time::from_storage(&row.start_time).map_err(|err| corrupt(err.to_string()))?;
        let end_time =
            time::from_storage(&row.end_time).map_err(|err| corrupt(err.to_string()))?;
        let details = TripDetails {
            origin: Coordinates {
                lat: row.origin_lat,
                lon: row.origin_lon,
            },
            destination: Coordinates {
                lat: row.destination_lat,
                lon: row.destination_lon,
            },
            start_time,
            end_time,
            mode: row.mode.parse().map_err(|err| corrupt(format!("{err}")))?,
            distance: row.distance,
            purpose: row.purpose.parse().map_err(|err| corrupt(format!("{err}")))?,
            companions: u32::try_from(row.companions)
                .map_err(|err| corrupt(err.to_string()))?,
            frequency: row.frequency.parse().map_err(|err| corrupt(format!("{err}")))?,
            cost: row.cost,
        };
        Ok(Trip::new(id, row.trip_number, details))
    }
}
