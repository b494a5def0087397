use chrono::{DateTime, Utc};
use tracing::warn;
use trailguard_common::{Coordinates, PlausibilityConfig};
use trailguard_db_entities::LocationSample;

use crate::geo::distance_km;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// An average speed needs at least one hop between two samples
pub const MIN_HISTORY_LEN: usize = 2;

/// A previously accepted position of a user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedLocation {
    pub coordinates: Coordinates,
    pub recorded_at: DateTime<Utc>,
}

impl From<&LocationSample::Model> for TrackedLocation {
    fn from(sample: &LocationSample::Model) -> Self {
        Self {
            coordinates: Coordinates::new(sample.latitude, sample.longitude),
            recorded_at: sample.created_at,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RejectionReason {
    #[error("latitude out of range: {latitude} is not between -90 and 90")]
    LatitudeOutOfRange { latitude: f64 },
    #[error("longitude out of range: {longitude} is not between -180 and 180")]
    LongitudeOutOfRange { longitude: f64 },
    #[error("invalid time difference between locations {newer} and {older}")]
    InvalidHistoryTimeDifference {
        newer: Coordinates,
        older: Coordinates,
    },
    #[error("invalid time difference for new location")]
    InvalidTimeDifference,
    #[error("speed {speed_kmh:.2} km/h is unreasonably high")]
    UnreasonablyHighSpeed { speed_kmh: f64 },
    #[error(
        "high distance ({distance_km:.2} km) but speed {speed_kmh:.2} km/h exceeds realistic air travel"
    )]
    ExceedsAirTravel { distance_km: f64, speed_kmh: f64 },
    #[error("new speed {speed_kmh:.2} km/h exceeds maximum allowed speed of {limit_kmh:.2} km/h")]
    ExceedsGroundSpeed { speed_kmh: f64, limit_kmh: f64 },
    #[error(
        "sudden acceleration: new speed {speed_kmh:.2} km/h is more than {multiplier:.2}x the historical average {average_kmh:.2} km/h"
    )]
    SuddenAcceleration {
        speed_kmh: f64,
        average_kmh: f64,
        multiplier: f64,
    },
    #[error(
        "implausibly slow compared to trend: new speed {speed_kmh:.2} km/h against previous average {average_kmh:.2} km/h"
    )]
    ImplausiblySlow { speed_kmh: f64, average_kmh: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationVerdict {
    Accepted,
    Rejected(RejectionReason),
}

impl LocationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Human-readable reason, empty when accepted
    pub fn reason(&self) -> String {
        match self {
            Self::Accepted => String::new(),
            Self::Rejected(reason) => reason.to_string(),
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

impl From<Result<(), RejectionReason>> for LocationVerdict {
    fn from(result: Result<(), RejectionReason>) -> Self {
        match result {
            Ok(()) => Self::Accepted,
            Err(reason) => Self::Rejected(reason),
        }
    }
}

fn hours_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Decides whether a reported position is physically reachable from a
/// user's recent trail.
#[derive(Debug, Clone, Default)]
pub struct PlausibilityValidator {
    config: PlausibilityConfig,
}

impl PlausibilityValidator {
    /// A `history_len` below [`MIN_HISTORY_LEN`] is raised to it.
    pub fn new(mut config: PlausibilityConfig) -> Self {
        if config.history_len < MIN_HISTORY_LEN {
            warn!(
                history_len = config.history_len,
                "plausibility.history_len is too small, using {MIN_HISTORY_LEN}"
            );
            config.history_len = MIN_HISTORY_LEN;
        }
        Self { config }
    }

    /// Number of recent valid samples the validator wants to see
    pub fn history_len(&self) -> usize {
        self.config.history_len
    }

    /// Range preconditions, independent of any history
    pub fn check_ranges(&self, candidate: &Coordinates) -> Result<(), RejectionReason> {
        if !candidate.latitude_in_range() {
            return Err(RejectionReason::LatitudeOutOfRange {
                latitude: candidate.latitude,
            });
        }
        if !candidate.longitude_in_range() {
            return Err(RejectionReason::LongitudeOutOfRange {
                longitude: candidate.longitude,
            });
        }
        Ok(())
    }

    /// `history` holds the user's most recent valid samples, newest first.
    pub fn validate(
        &self,
        candidate: &Coordinates,
        history: &[TrackedLocation],
        now: DateTime<Utc>,
    ) -> LocationVerdict {
        self.check_ranges(candidate)
            .and_then(|()| self.check_speed(candidate, history, now))
            .into()
    }

    fn check_speed(
        &self,
        candidate: &Coordinates,
        history: &[TrackedLocation],
        now: DateTime<Utc>,
    ) -> Result<(), RejectionReason> {
        if history.len() < self.config.history_len {
            // Not enough data to judge
            return Ok(());
        }
        let recent = &history[..self.config.history_len];

        let average_kmh = average_speed_kmh(recent)?;

        let last = &recent[0];
        let distance = distance_km(&last.coordinates, candidate);
        let elapsed = hours_between(now, last.recorded_at);
        if elapsed <= 0.0 {
            return Err(RejectionReason::InvalidTimeDifference);
        }
        let speed_kmh = distance / elapsed;

        let c = &self.config;
        if speed_kmh > c.insane_speed_kmh {
            return Err(RejectionReason::UnreasonablyHighSpeed { speed_kmh });
        }

        if distance > c.long_haul_distance_km {
            if speed_kmh > c.max_air_speed_kmh {
                return Err(RejectionReason::ExceedsAirTravel {
                    distance_km: distance,
                    speed_kmh,
                });
            }
            return Ok(());
        }

        if speed_kmh > c.max_ground_speed_kmh {
            return Err(RejectionReason::ExceedsGroundSpeed {
                speed_kmh,
                limit_kmh: c.max_ground_speed_kmh,
            });
        }

        if speed_kmh > average_kmh * c.acceleration_multiplier {
            return Err(RejectionReason::SuddenAcceleration {
                speed_kmh,
                average_kmh,
                multiplier: c.acceleration_multiplier,
            });
        }

        if average_kmh > c.deceleration_min_average_kmh
            && speed_kmh < average_kmh / c.deceleration_divisor
        {
            return Err(RejectionReason::ImplausiblySlow {
                speed_kmh,
                average_kmh,
            });
        }

        Ok(())
    }
}

/// Mean of the speeds between consecutive samples, newest first.
fn average_speed_kmh(samples: &[TrackedLocation]) -> Result<f64, RejectionReason> {
    let mut summed = 0.0;
    for pair in samples.windows(2) {
        let (newer, older) = (&pair[0], &pair[1]);
        let elapsed = hours_between(newer.recorded_at, older.recorded_at);
        if elapsed <= 0.0 {
            return Err(RejectionReason::InvalidHistoryTimeDifference {
                newer: newer.coordinates,
                older: older.coordinates,
            });
        }
        summed += distance_km(&older.coordinates, &newer.coordinates) / elapsed;
    }
    Ok(summed / (samples.len() - 1) as f64)
}
