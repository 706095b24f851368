use crate::{config::AppConfig, db::DbPool, services::repository::TripRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub trips: TripRepository,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let trips = TripRepository::new(db.clone());
        Self { config, db, trips }
    }
}
