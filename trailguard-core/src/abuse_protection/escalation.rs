use chrono::{DateTime, Duration, NaiveDate, Utc};
use trailguard_common::AbuseProtectionConfig;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Length and lifetime of one ban episode, both in hours
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BanStep {
    pub banned_length: f64,
    pub expires_in_hours: f64,
}

pub fn first_ban_step(config: &AbuseProtectionConfig) -> BanStep {
    BanStep {
        banned_length: config.initial_ban_length_hours,
        expires_in_hours: config.initial_ban_length_hours,
    }
}

/// Ban step for a repeat offender whose previous step was `previous_length` hours.
/// There is no upper bound on the length.
pub fn next_ban_step(previous_length: f64, config: &AbuseProtectionConfig) -> BanStep {
    let banned_length = previous_length * config.ban_length_multiplier;
    BanStep {
        banned_length,
        expires_in_hours: config
            .expiry_policy
            .expiry_hours(banned_length, config.ban_length_multiplier),
    }
}

/// Saturates at the largest representable duration
pub fn hours_to_duration(hours: f64) -> Duration {
    let millis = (hours * MILLIS_PER_HOUR).round();
    if millis >= i64::MAX as f64 {
        return Duration::MAX;
    }
    Duration::try_milliseconds(millis as i64).unwrap_or(Duration::MAX)
}

/// Last instant a ban can be stored with, the end of year 9999
pub fn latest_ban_expiry() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map_or(DateTime::<Utc>::MAX_UTC, |latest| latest.and_utc())
}

/// Saturates at [`latest_ban_expiry`] however long the ban grows
pub fn ban_expiry(now: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    let latest = latest_ban_expiry();
    now.checked_add_signed(hours_to_duration(hours))
        .map_or(latest, |until| until.min(latest))
}
