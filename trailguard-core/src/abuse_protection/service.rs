use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trailguard_common::{AbuseProtectionConfig, TrailguardError};
use trailguard_db_entities::AddressBan;

use super::escalation::{ban_expiry, first_ban_step, next_ban_step};
use crate::ledger::ban::{self, BanTerms};
use crate::ledger::rejection::{self, RejectedRequestInfo};

/// Information about a banned address
#[derive(Clone, Debug, PartialEq)]
pub struct BanInfo {
    pub address: String,
    pub last_banned_at: DateTime<Utc>,
    pub banned_until: DateTime<Utc>,
    /// Hours
    pub banned_length: f64,
    pub banned_times: i32,
    pub reason: String,
    pub message: String,
}

impl BanInfo {
    fn from_record(record: AddressBan::Model, message: String) -> Self {
        Self {
            address: record.address,
            last_banned_at: record.last_banned_at,
            banned_until: record.banned_until,
            banned_length: record.banned_length,
            banned_times: record.banned_times,
            reason: record.reason,
            message,
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.banned_until - now).max(Duration::zero())
    }
}

/// What a recorded rejection led to
#[derive(Clone, Debug, PartialEq)]
pub enum EscalationOutcome {
    /// Below the threshold; `rejections` within the window so far
    Recorded { rejections: u64 },
    /// First ban for this address
    Banned(BanInfo),
    /// An existing ban record was escalated
    Escalated(BanInfo),
}

impl EscalationOutcome {
    pub fn ban(&self) -> Option<&BanInfo> {
        match self {
            Self::Recorded { .. } => None,
            Self::Banned(info) | Self::Escalated(info) => Some(info),
        }
    }
}

/// Counters for operators
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityStatus {
    pub banned_address_count: u64,
    pub rejections_last_hour: u64,
    pub rejections_in_window: u64,
}

/// Tallies rejected requests per address and bans repeat offenders with
/// exponential backoff. Ban records are never deleted.
pub struct AbuseProtectionService {
    config: AbuseProtectionConfig,
    db: Arc<Mutex<DatabaseConnection>>,
}

impl AbuseProtectionService {
    pub fn new(config: AbuseProtectionConfig, db: Arc<Mutex<DatabaseConnection>>) -> Self {
        Self { config, db }
    }

    pub fn config(&self) -> &AbuseProtectionConfig {
        &self.config
    }

    /// Start of the rejection window ending at `now`
    fn window_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, TrailguardError> {
        Duration::from_std(self.config.window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                TrailguardError::InvalidConfig("abuse_protection.window is too large".into())
            })
    }

    /// Returns the ban if `address` is banned at `now`.
    /// Expired records are kept for future escalation but answer `None`.
    pub async fn is_address_banned(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BanInfo>, TrailguardError> {
        let db = self.db.lock().await;
        let Some(record) = ban::get_ban(&*db, address).await? else {
            return Ok(None);
        };
        if !record.is_active(now) {
            return Ok(None);
        }
        debug!(address = %address, banned_until = %record.banned_until, "Address is banned");
        Ok(Some(BanInfo::from_record(
            record,
            self.config.blocked_message(),
        )))
    }

    /// Records a rejected request and bans or escalates the address once
    /// the number of rejections within the window reaches the threshold.
    ///
    /// Never call this for requests that were refused because the address
    /// was already banned.
    pub async fn record_and_maybe_escalate(
        &self,
        rejection: RejectedRequestInfo,
        now: DateTime<Utc>,
    ) -> Result<EscalationOutcome, TrailguardError> {
        let since = self.window_start(now)?;

        let db = self.db.lock().await;
        let txn = db.begin().await?;

        // 1. Insert rejection record
        rejection::insert_rejection(&txn, &rejection, now).await?;

        // 2. Check address threshold
        let count = rejection::count_rejections(&txn, &rejection.address, since).await?;

        let outcome = if count >= u64::from(self.config.max_rejections) {
            self.ban_or_escalate(&txn, &rejection.address, count, now)
                .await?
        } else {
            EscalationOutcome::Recorded { rejections: count }
        };

        // 3. Commit transaction
        txn.commit().await?;

        info!(
            address = %rejection.address,
            status_code = rejection.status_code,
            reason = %rejection.reason,
            rejection_count = count,
            "Recorded rejected request"
        );

        Ok(outcome)
    }

    async fn ban_or_escalate<C: ConnectionTrait>(
        &self,
        db: &C,
        address: &str,
        count: u64,
        now: DateTime<Utc>,
    ) -> Result<EscalationOutcome, TrailguardError> {
        let window = humantime::format_duration(self.config.window);

        if ban::get_ban(db, address).await?.is_none() {
            let step = first_ban_step(&self.config);
            let terms = BanTerms {
                reason: format!(
                    "Too many rejected requests: {count} within {window}"
                ),
                banned_at: now,
                banned_until: ban_expiry(now, step.expires_in_hours),
                banned_length: step.banned_length,
            };
            if let Some(record) = ban::insert_first_ban(db, address, terms).await? {
                warn!(
                    address = %address,
                    rejection_count = count,
                    banned_until = %record.banned_until,
                    banned_length_hours = record.banned_length,
                    "Address banned"
                );
                return Ok(EscalationOutcome::Banned(BanInfo::from_record(
                    record,
                    self.config.blocked_message(),
                )));
            }
            debug!(address = %address, "Ban record created concurrently, escalating instead");
        }

        let current = ban::get_ban(db, address)
            .await?
            .ok_or(TrailguardError::InconsistentState)?;
        let step = next_ban_step(current.banned_length, &self.config);
        let terms = BanTerms {
            reason: format!(
                "Banned again: {count} rejected requests within {window}"
            ),
            banned_at: now,
            banned_until: ban_expiry(now, step.expires_in_hours),
            banned_length: step.banned_length,
        };
        let record = ban::escalate_ban(db, &current, terms).await?;

        warn!(
            address = %address,
            rejection_count = count,
            banned_times = record.banned_times,
            banned_until = %record.banned_until,
            banned_length_hours = record.banned_length,
            "Address ban escalated"
        );
        Ok(EscalationOutcome::Escalated(BanInfo::from_record(
            record,
            self.config.blocked_message(),
        )))
    }

    /// Raw ban record, active or not
    pub async fn ban_record(
        &self,
        address: &str,
    ) -> Result<Option<AddressBan::Model>, TrailguardError> {
        let db = self.db.lock().await;
        ban::get_ban(&*db, address).await
    }

    /// Rejections for `address` in the window ending at `now`
    pub async fn rejection_count(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, TrailguardError> {
        let since = self.window_start(now)?;
        let db = self.db.lock().await;
        rejection::count_rejections(&*db, address, since).await
    }

    /// List all currently banned addresses
    pub async fn list_banned(&self, now: DateTime<Utc>) -> Result<Vec<BanInfo>, TrailguardError> {
        let db = self.db.lock().await;
        let message = self.config.blocked_message();
        Ok(ban::list_active_bans(&*db, now)
            .await?
            .into_iter()
            .map(|record| BanInfo::from_record(record, message.clone()))
            .collect())
    }

    pub async fn security_status(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SecurityStatus, TrailguardError> {
        let since = self.window_start(now)?;
        let db = self.db.lock().await;

        let banned_address_count = ban::count_active_bans(&*db, now).await?;
        let rejections_last_hour =
            rejection::count_all_rejections(&*db, now - Duration::hours(1)).await?;
        let rejections_in_window = rejection::count_all_rejections(&*db, since).await?;

        Ok(SecurityStatus {
            banned_address_count,
            rejections_last_hour,
            rejections_in_window,
        })
    }
}

#[cfg(test)]
mod tests {
    use trailguard_common::BanExpiryPolicy;

    use super::*;
    use crate::test_helpers::{shared_memory_db, t0};

    const ADDRESS: &str = "203.0.113.7";

    fn config(max_rejections: u32) -> AbuseProtectionConfig {
        AbuseProtectionConfig {
            max_rejections,
            ..Default::default()
        }
    }

    async fn service(config: AbuseProtectionConfig) -> AbuseProtectionService {
        AbuseProtectionService::new(config, shared_memory_db().await)
    }

    fn rejection() -> RejectedRequestInfo {
        RejectedRequestInfo::new(ADDRESS, 401, "invalid credentials")
    }

    /// Records `n` rejections one second apart starting at `start`
    async fn reject_n(
        service: &AbuseProtectionService,
        n: u32,
        start: DateTime<Utc>,
    ) -> EscalationOutcome {
        let mut outcome = None;
        for i in 0..n {
            outcome = Some(
                service
                    .record_and_maybe_escalate(rejection(), start + Duration::seconds(i.into()))
                    .await
                    .unwrap(),
            );
        }
        outcome.unwrap()
    }

    #[tokio::test]
    async fn test_first_rejection_does_not_ban() {
        let service = service(config(3)).await;
        let outcome = service
            .record_and_maybe_escalate(rejection(), t0())
            .await
            .unwrap();
        assert_eq!(outcome, EscalationOutcome::Recorded { rejections: 1 });
        assert!(service.is_address_banned(ADDRESS, t0()).await.unwrap().is_none());
        assert!(service.ban_record(ADDRESS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_threshold_creates_fifteen_minute_ban() {
        let service = service(config(3)).await;
        assert!(matches!(
            reject_n(&service, 2, t0()).await,
            EscalationOutcome::Recorded { rejections: 2 }
        ));

        let at = t0() + Duration::seconds(2);
        let outcome = service
            .record_and_maybe_escalate(rejection(), at)
            .await
            .unwrap();
        let EscalationOutcome::Banned(info) = outcome else {
            panic!("expected a first ban, got {outcome:?}");
        };
        assert_eq!(info.banned_length, 0.25);
        assert_eq!(info.banned_times, 1);
        assert_eq!(info.last_banned_at, at);
        assert_eq!(info.banned_until, at + Duration::minutes(15));
        assert!(info.reason.contains("3 within 1day"));

        let banned = service
            .is_address_banned(ADDRESS, at + Duration::minutes(14))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(banned.remaining(at + Duration::minutes(14)), Duration::minutes(1));
        assert!(banned.message.contains("temporarily blocked"));
    }

    #[tokio::test]
    async fn test_expired_ban_is_not_active_but_retained() {
        let service = service(config(1)).await;
        reject_n(&service, 1, t0()).await;

        let after = t0() + Duration::minutes(15);
        assert!(service.is_address_banned(ADDRESS, after).await.unwrap().is_none());
        let record = service.ban_record(ADDRESS).await.unwrap().unwrap();
        assert_eq!(record.banned_times, 1);
        assert!(!record.is_active(after));
    }

    #[tokio::test]
    async fn test_reoffending_after_expiry_escalates_with_compounding_expiry() {
        let service = service(config(3)).await;
        reject_n(&service, 3, t0()).await;

        // The first ban has expired, the earlier rejections are still in the window
        let later = t0() + Duration::hours(1);
        assert!(service.is_address_banned(ADDRESS, later).await.unwrap().is_none());
        let outcome = service
            .record_and_maybe_escalate(rejection(), later)
            .await
            .unwrap();
        let EscalationOutcome::Escalated(info) = outcome else {
            panic!("expected an escalation, got {outcome:?}");
        };
        assert_eq!(info.banned_length, 0.5);
        assert_eq!(info.banned_times, 2);
        assert_eq!(info.last_banned_at, later);
        // 0.5h doubled again for the expiry
        assert_eq!(info.banned_until, later + Duration::hours(1));
        assert_eq!(info.reason.matches(" | ").count(), 1);
        assert!(service.is_address_banned(ADDRESS, later).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_plain_expiry_policy() {
        let service = service(AbuseProtectionConfig {
            max_rejections: 3,
            expiry_policy: BanExpiryPolicy::Plain,
            ..Default::default()
        })
        .await;
        reject_n(&service, 3, t0()).await;

        let later = t0() + Duration::hours(1);
        let outcome = service
            .record_and_maybe_escalate(rejection(), later)
            .await
            .unwrap();
        let info = outcome.ban().unwrap();
        assert_eq!(info.banned_length, 0.5);
        assert_eq!(info.banned_times, 2);
        assert_eq!(info.banned_until, later + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_escalation_survives_window_reset() {
        let service = service(config(2)).await;
        reject_n(&service, 2, t0()).await;

        // A new episode two days later starts from the prior ban level
        let later = t0() + Duration::days(2);
        let outcome = reject_n(&service, 2, later).await;
        let EscalationOutcome::Escalated(info) = outcome else {
            panic!("expected an escalation, got {outcome:?}");
        };
        assert_eq!(info.banned_times, 2);
        assert_eq!(info.banned_length, 0.5);
    }

    #[tokio::test]
    async fn test_old_rejections_fall_out_of_the_window() {
        let service = service(config(3)).await;
        reject_n(&service, 2, t0()).await;

        let later = t0() + Duration::hours(25);
        let outcome = service
            .record_and_maybe_escalate(rejection(), later)
            .await
            .unwrap();
        assert_eq!(outcome, EscalationOutcome::Recorded { rejections: 1 });
        assert_eq!(service.rejection_count(ADDRESS, later).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_addresses_are_independent() {
        let service = service(config(2)).await;
        reject_n(&service, 2, t0()).await;
        let other = service
            .record_and_maybe_escalate(RejectedRequestInfo::new("198.51.100.1", 400, "bad"), t0())
            .await
            .unwrap();
        assert_eq!(other, EscalationOutcome::Recorded { rejections: 1 });
        assert!(service
            .is_address_banned("198.51.100.1", t0())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_rejections_ban_exactly_once() {
        let service = Arc::new(service(config(5)).await);
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .record_and_maybe_escalate(rejection(), t0())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut banned = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), EscalationOutcome::Banned(_)) {
                banned += 1;
            }
        }
        assert_eq!(banned, 1);
        let record = service.ban_record(ADDRESS).await.unwrap().unwrap();
        assert_eq!(record.banned_times, 1);
    }

    #[tokio::test]
    async fn test_unbounded_ban_saturates_and_round_trips() {
        let service = service(AbuseProtectionConfig {
            max_rejections: 1,
            initial_ban_length_hours: 1e12,
            ..Default::default()
        })
        .await;
        reject_n(&service, 1, t0()).await;

        let record = service.ban_record(ADDRESS).await.unwrap().unwrap();
        assert_eq!(record.banned_until, crate::abuse_protection::latest_ban_expiry());
        assert!(service
            .is_address_banned(ADDRESS, t0() + Duration::days(365 * 100))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_short_window_is_named_in_reason() {
        let service = service(AbuseProtectionConfig {
            max_rejections: 1,
            window: std::time::Duration::from_secs(30 * 60),
            ..Default::default()
        })
        .await;
        let outcome = reject_n(&service, 1, t0()).await;
        assert!(outcome.ban().unwrap().reason.ends_with("1 within 30m"));
    }

    #[tokio::test]
    async fn test_oversized_window_is_a_config_error() {
        let service = service(AbuseProtectionConfig {
            window: std::time::Duration::from_secs(300_000 * 365 * 86_400),
            ..Default::default()
        })
        .await;
        let err = service
            .record_and_maybe_escalate(rejection(), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, TrailguardError::InvalidConfig(_)));
        assert!(matches!(
            service.rejection_count(ADDRESS, t0()).await,
            Err(TrailguardError::InvalidConfig(_))
        ));
        assert!(matches!(
            service.security_status(t0()).await,
            Err(TrailguardError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_security_status() {
        let service = service(config(2)).await;
        reject_n(&service, 2, t0()).await;
        service
            .record_and_maybe_escalate(
                RejectedRequestInfo::new("198.51.100.1", 400, "bad"),
                t0() - Duration::hours(3),
            )
            .await
            .unwrap();

        let status = service.security_status(t0() + Duration::seconds(5)).await.unwrap();
        assert_eq!(
            status,
            SecurityStatus {
                banned_address_count: 1,
                rejections_last_hour: 2,
                rejections_in_window: 3,
            }
        );
        assert_eq!(service.list_banned(t0()).await.unwrap().len(), 1);
    }
}
