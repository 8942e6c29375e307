use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Entities picked up by schema sync.
const ENTITY_PATH: &str = "server::entity::*";

fn pool_options(db_url: &str) -> ConnectOptions {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    // Request handlers and job workers share this pool. A claim holds its
    // connection only until commit, workers take one per job.
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true);
    opt
}

/// Connect and create any missing tables and columns.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(pool_options(db_url)).await?;
    db.get_schema_registry(ENTITY_PATH).sync(&db).await?;
    Ok(db)
}
