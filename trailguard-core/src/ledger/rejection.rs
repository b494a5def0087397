use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use trailguard_common::TrailguardError;
use trailguard_db_entities::RejectedRequest;
use uuid::Uuid;

/// A request that was turned away for a substantive reason
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRequestInfo {
    pub address: String,
    pub status_code: u16,
    pub reason: String,
    /// User the request claimed to act for
    pub subject: Option<String>,
}

impl RejectedRequestInfo {
    pub fn new(address: impl Into<String>, status_code: u16, reason: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status_code,
            reason: reason.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

pub async fn insert_rejection<C: ConnectionTrait>(
    db: &C,
    rejection: &RejectedRequestInfo,
    created_at: DateTime<Utc>,
) -> Result<RejectedRequest::Model, TrailguardError> {
    let record = RejectedRequest::ActiveModel {
        id: Set(Uuid::new_v4()),
        address: Set(rejection.address.clone()),
        status_code: Set(rejection.status_code.into()),
        reason: Set(rejection.reason.clone()),
        subject: Set(rejection.subject.clone()),
        created_at: Set(created_at),
    };
    Ok(record.insert(db).await?)
}

/// Rejections for `address` at or after `since`
pub async fn count_rejections<C: ConnectionTrait>(
    db: &C,
    address: &str,
    since: DateTime<Utc>,
) -> Result<u64, TrailguardError> {
    Ok(RejectedRequest::Entity::find()
        .filter(RejectedRequest::Column::Address.eq(address))
        .filter(RejectedRequest::Column::CreatedAt.gte(since))
        .count(db)
        .await?)
}

/// Rejections from any address at or after `since`
pub async fn count_all_rejections<C: ConnectionTrait>(
    db: &C,
    since: DateTime<Utc>,
) -> Result<u64, TrailguardError> {
    Ok(RejectedRequest::Entity::find()
        .filter(RejectedRequest::Column::CreatedAt.gte(since))
        .count(db)
        .await?)
}
