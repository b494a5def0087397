use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::sync::Mutex;
use trailguard_db_migrations::migrate_database;

/// Fresh migrated in-memory database. A single pooled connection keeps
/// every query on the same memory database.
pub async fn memory_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    migrate_database(&db).await.unwrap();
    db
}

pub async fn shared_memory_db() -> Arc<Mutex<DatabaseConnection>> {
    Arc::new(Mutex::new(memory_db().await))
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}
