use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::jobs::JobClient;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub jobs: JobClient,
}
