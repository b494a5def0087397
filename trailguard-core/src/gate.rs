//! Request-boundary checks in front of the location service.
//!
//! A banned address is refused before any work is done and the refusal is
//! not counted as a rejection. Substantive failures are fed into abuse
//! protection.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error};
use trailguard_common::{Coordinates, TrailguardError};

use crate::abuse_protection::{
    AbuseProtectionService, BanInfo, EscalationOutcome, RejectedRequestInfo,
};
use crate::location::LocationService;
use crate::plausibility::LocationVerdict;

pub const STATUS_BAD_REQUEST: u16 = 400;

#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
    Allowed,
    Denied {
        until: DateTime<Utc>,
        remaining: Duration,
        message: String,
    },
}

impl Admission {
    fn denied(ban: BanInfo, now: DateTime<Utc>) -> Self {
        Self::Denied {
            until: ban.banned_until,
            remaining: ban.remaining(now),
            message: ban.message,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Accepted,
    Rejected {
        reason: String,
        escalation: EscalationOutcome,
    },
    /// The address is banned, nothing was recorded
    Denied(Admission),
}

pub struct RequestGate {
    locations: Arc<LocationService>,
    abuse_protection: Arc<AbuseProtectionService>,
}

fn log_failure<T>(
    result: Result<T, TrailguardError>,
    operation: &str,
) -> Result<T, TrailguardError> {
    result.inspect_err(|error| error!(%error, operation, "Request gate failure"))
}

impl RequestGate {
    pub fn new(
        locations: Arc<LocationService>,
        abuse_protection: Arc<AbuseProtectionService>,
    ) -> Self {
        Self {
            locations,
            abuse_protection,
        }
    }

    pub async fn admit(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<Admission, TrailguardError> {
        let ban = log_failure(
            self.abuse_protection.is_address_banned(address, now).await,
            "admit",
        )?;
        Ok(match ban {
            Some(ban) => {
                debug!(address = %address, banned_until = %ban.banned_until, "Request denied");
                Admission::denied(ban, now)
            }
            None => Admission::Allowed,
        })
    }

    pub async fn submit_location(
        &self,
        address: &str,
        user_id: &str,
        candidate: Coordinates,
        now: DateTime<Utc>,
    ) -> Result<Submission, TrailguardError> {
        let admission = self.admit(address, now).await?;
        if !admission.is_allowed() {
            return Ok(Submission::Denied(admission));
        }

        let verdict = log_failure(
            self.locations.check_location(user_id, candidate, now).await,
            "check_location",
        )?;

        match verdict {
            LocationVerdict::Accepted => {
                debug!(address = %address, user_id = %user_id, "Location submission accepted");
                Ok(Submission::Accepted)
            }
            LocationVerdict::Rejected(reason) => {
                let reason = reason.to_string();
                let escalation = self
                    .report_failure(address, STATUS_BAD_REQUEST, &reason, Some(user_id), now)
                    .await?;
                Ok(Submission::Rejected { reason, escalation })
            }
        }
    }

    /// Records a substantive failure owned by the request layer, such as
    /// bad credentials or malformed input.
    pub async fn report_failure(
        &self,
        address: &str,
        status_code: u16,
        reason: &str,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<EscalationOutcome, TrailguardError> {
        let mut rejection = RejectedRequestInfo::new(address, status_code, reason);
        if let Some(subject) = subject {
            rejection = rejection.with_subject(subject);
        }
        log_failure(
            self.abuse_protection
                .record_and_maybe_escalate(rejection, now)
                .await,
            "record_rejection",
        )
    }
}
