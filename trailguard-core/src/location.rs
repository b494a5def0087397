use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tokio::sync::Mutex;
use tracing::{debug, info};
use trailguard_common::{Coordinates, PlausibilityConfig, TrailguardError};
use trailguard_db_entities::LocationSample;

use crate::ledger::location::{insert_location, last_valid_locations};
use crate::plausibility::{LocationVerdict, PlausibilityValidator, TrackedLocation};

/// Accepts location reports, judges them against the user's trail and
/// appends every report to the ledger.
pub struct LocationService {
    validator: PlausibilityValidator,
    db: Arc<Mutex<DatabaseConnection>>,
}

impl LocationService {
    pub fn new(config: PlausibilityConfig, db: Arc<Mutex<DatabaseConnection>>) -> Self {
        Self {
            validator: PlausibilityValidator::new(config),
            db,
        }
    }

    pub fn validator(&self) -> &PlausibilityValidator {
        &self.validator
    }

    /// Validates and records a report made at `now`.
    ///
    /// The record is written whatever the verdict. Out-of-range coordinates
    /// are rejected without consulting the history.
    pub async fn check_location(
        &self,
        user_id: &str,
        candidate: Coordinates,
        now: DateTime<Utc>,
    ) -> Result<LocationVerdict, TrailguardError> {
        let db = self.db.lock().await;
        let txn = db.begin().await?;

        let verdict = match self.validator.check_ranges(&candidate) {
            Err(reason) => LocationVerdict::Rejected(reason),
            Ok(()) => {
                let history: Vec<TrackedLocation> =
                    last_valid_locations(&txn, user_id, self.validator.history_len() as u64)
                        .await?
                        .iter()
                        .map(TrackedLocation::from)
                        .collect();
                self.validator.validate(&candidate, &history, now)
            }
        };

        insert_location(&txn, user_id, candidate, now, &verdict).await?;
        txn.commit().await?;

        match &verdict {
            LocationVerdict::Accepted => {
                debug!(user_id = %user_id, location = %candidate, "Location accepted")
            }
            LocationVerdict::Rejected(reason) => {
                info!(user_id = %user_id, location = %candidate, %reason, "Location rejected")
            }
        }

        Ok(verdict)
    }

    /// Most recent valid samples, newest first
    pub async fn last_valid_locations(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<LocationSample::Model>, TrailguardError> {
        let db = self.db.lock().await;
        last_valid_locations(&*db, user_id, limit).await
    }
}
