use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set};
use trailguard_common::TrailguardError;
use trailguard_db_entities::AddressBan;
use uuid::Uuid;

pub const REASON_SEPARATOR: &str = " | ";

/// Values of a ban episode, either the first one or an escalation
#[derive(Clone, Debug, PartialEq)]
pub struct BanTerms {
    pub reason: String,
    pub banned_at: DateTime<Utc>,
    pub banned_until: DateTime<Utc>,
    /// Hours
    pub banned_length: f64,
}

pub async fn get_ban<C: ConnectionTrait>(
    db: &C,
    address: &str,
) -> Result<Option<AddressBan::Model>, TrailguardError> {
    Ok(AddressBan::Entity::find()
        .filter(AddressBan::Column::Address.eq(address))
        .one(db)
        .await?)
}

/// Creates the ban record for a first offense.
///
/// Returns `None` if a record for the address already exists, which
/// happens when a concurrent request created it first.
pub async fn insert_first_ban<C: ConnectionTrait>(
    db: &C,
    address: &str,
    terms: BanTerms,
) -> Result<Option<AddressBan::Model>, TrailguardError> {
    let model = AddressBan::Model {
        id: Uuid::new_v4(),
        address: address.to_owned(),
        reason: terms.reason,
        last_banned_at: terms.banned_at,
        banned_until: terms.banned_until,
        banned_length: terms.banned_length,
        banned_times: 1,
    };
    let record = AddressBan::ActiveModel {
        id: Set(model.id),
        address: Set(model.address.clone()),
        reason: Set(model.reason.clone()),
        last_banned_at: Set(model.last_banned_at),
        banned_until: Set(model.banned_until),
        banned_length: Set(model.banned_length),
        banned_times: Set(model.banned_times),
    };

    match AddressBan::Entity::insert(record)
        .on_conflict(
            OnConflict::column(AddressBan::Column::Address)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await
    {
        Ok(_) => Ok(Some(model)),
        Err(DbErr::RecordNotInserted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Applies an escalation on top of `current`, appending the reason.
///
/// The update only matches while `banned_times` still has the value read
/// into `current`. A concurrent escalation makes it fail with
/// [`TrailguardError::Conflict`].
pub async fn escalate_ban<C: ConnectionTrait>(
    db: &C,
    current: &AddressBan::Model,
    terms: BanTerms,
) -> Result<AddressBan::Model, TrailguardError> {
    let updated = AddressBan::Model {
        reason: format!("{}{REASON_SEPARATOR}{}", current.reason, terms.reason),
        last_banned_at: terms.banned_at,
        banned_until: terms.banned_until,
        banned_length: terms.banned_length,
        banned_times: current.banned_times + 1,
        ..current.clone()
    };

    let result = AddressBan::Entity::update_many()
        .set(AddressBan::ActiveModel {
            reason: Set(updated.reason.clone()),
            last_banned_at: Set(updated.last_banned_at),
            banned_until: Set(updated.banned_until),
            banned_length: Set(updated.banned_length),
            banned_times: Set(updated.banned_times),
            ..Default::default()
        })
        .filter(AddressBan::Column::Address.eq(&current.address))
        .filter(AddressBan::Column::BannedTimes.eq(current.banned_times))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(TrailguardError::Conflict {
            address: current.address.clone(),
        });
    }
    Ok(updated)
}

/// Bans whose expiry lies after `now`
pub async fn list_active_bans<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> Result<Vec<AddressBan::Model>, TrailguardError> {
    Ok(AddressBan::Entity::find()
        .filter(AddressBan::Column::BannedUntil.gt(now))
        .all(db)
        .await?)
}

pub async fn count_active_bans<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> Result<u64, TrailguardError> {
    Ok(AddressBan::Entity::find()
        .filter(AddressBan::Column::BannedUntil.gt(now))
        .count(db)
        .await?)
}
