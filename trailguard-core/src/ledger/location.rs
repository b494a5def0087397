use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use trailguard_common::{Coordinates, TrailguardError};
use trailguard_db_entities::LocationSample;
use uuid::Uuid;

use crate::plausibility::LocationVerdict;

/// NaN cannot be stored in a REAL column, the sample is kept as 0 and the
/// validation reason still names the reported value.
fn storable(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Appends a sample. Rejected samples are stored too, flagged invalid.
pub async fn insert_location<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    coordinates: Coordinates,
    created_at: DateTime<Utc>,
    verdict: &LocationVerdict,
) -> Result<LocationSample::Model, TrailguardError> {
    let record = LocationSample::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id.to_owned()),
        latitude: Set(storable(coordinates.latitude)),
        longitude: Set(storable(coordinates.longitude)),
        created_at: Set(created_at),
        is_valid: Set(verdict.is_accepted()),
        validation_reason: Set(verdict.reason()),
    };
    Ok(record.insert(db).await?)
}

/// The user's last `n` valid samples, most recent first
pub async fn last_valid_locations<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    n: u64,
) -> Result<Vec<LocationSample::Model>, TrailguardError> {
    Ok(LocationSample::Entity::find()
        .filter(LocationSample::Column::UserId.eq(user_id))
        .filter(LocationSample::Column::IsValid.eq(true))
        .order_by_desc(LocationSample::Column::CreatedAt)
        .limit(n)
        .all(db)
        .await?)
}
