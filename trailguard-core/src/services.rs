use std::sync::Arc;

use anyhow::Result;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tracing::info;
use trailguard_common::TrailguardConfig;

use crate::abuse_protection::AbuseProtectionService;
use crate::db::connect_to_db;
use crate::gate::RequestGate;
use crate::location::LocationService;

#[derive(Clone)]
pub struct Services {
    pub db: Arc<Mutex<DatabaseConnection>>,
    pub config: Arc<TrailguardConfig>,
    pub locations: Arc<LocationService>,
    pub abuse_protection: Arc<AbuseProtectionService>,
    pub gate: Arc<RequestGate>,
}

impl Services {
    pub async fn new(config: TrailguardConfig) -> Result<Self> {
        let db = connect_to_db(&config).await?;
        Ok(Self::from_connection(config, db))
    }

    pub fn from_connection(config: TrailguardConfig, db: DatabaseConnection) -> Self {
        let db = Arc::new(Mutex::new(db));

        let locations = Arc::new(LocationService::new(
            config.store.plausibility.clone(),
            db.clone(),
        ));
        let abuse_protection = Arc::new(AbuseProtectionService::new(
            config.store.abuse_protection.clone(),
            db.clone(),
        ));
        let gate = Arc::new(RequestGate::new(
            locations.clone(),
            abuse_protection.clone(),
        ));

        info!(
            max_rejections = config.store.abuse_protection.max_rejections,
            history_len = config.store.plausibility.history_len,
            "Services initialized"
        );

        Self {
            db,
            config: Arc::new(config),
            locations,
            abuse_protection,
            gate,
        }
    }
}
