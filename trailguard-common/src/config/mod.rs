mod defaults;

use std::path::PathBuf;
use std::time::Duration;

use defaults::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Secret, TrailguardError};

const DEFAULT_BLOCKED_MESSAGE: &str =
    "Your address has been temporarily blocked due to too many rejected requests.";

/// Thresholds for the speed plausibility check
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, JsonSchema)]
pub struct PlausibilityConfig {
    /// Number of recent valid samples required before any speed check runs
    #[serde(default = "_default_history_len")]
    pub history_len: usize,

    /// Speeds above this are rejected regardless of distance
    #[serde(default = "_default_insane_speed_kmh")]
    pub insane_speed_kmh: f64,

    /// Jumps longer than this are judged against `max_air_speed_kmh` only
    #[serde(default = "_default_long_haul_distance_km")]
    pub long_haul_distance_km: f64,

    #[serde(default = "_default_max_air_speed_kmh")]
    pub max_air_speed_kmh: f64,

    #[serde(default = "_default_max_ground_speed_kmh")]
    pub max_ground_speed_kmh: f64,

    #[serde(default = "_default_acceleration_multiplier")]
    pub acceleration_multiplier: f64,

    /// The deceleration check only applies above this historical average
    #[serde(default = "_default_deceleration_min_average_kmh")]
    pub deceleration_min_average_kmh: f64,

    #[serde(default = "_default_deceleration_divisor")]
    pub deceleration_divisor: f64,
}

impl Default for PlausibilityConfig {
    fn default() -> Self {
        Self {
            history_len: _default_history_len(),
            insane_speed_kmh: _default_insane_speed_kmh(),
            long_haul_distance_km: _default_long_haul_distance_km(),
            max_air_speed_kmh: _default_max_air_speed_kmh(),
            max_ground_speed_kmh: _default_max_ground_speed_kmh(),
            acceleration_multiplier: _default_acceleration_multiplier(),
            deceleration_min_average_kmh: _default_deceleration_min_average_kmh(),
            deceleration_divisor: _default_deceleration_divisor(),
        }
    }
}

/// How the expiry of an escalated ban is derived from its new length
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BanExpiryPolicy {
    /// The multiplier is applied once more on top of the already multiplied
    /// length, so with a multiplier of 2 the expiry grows 4x per escalation
    #[default]
    Compounding,
    /// The ban lasts exactly its new length
    Plain,
}

impl BanExpiryPolicy {
    /// Hours from now until an escalated ban of `banned_length` hours expires
    pub fn expiry_hours(&self, banned_length: f64, multiplier: f64) -> f64 {
        match self {
            Self::Compounding => banned_length * multiplier,
            Self::Plain => banned_length,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, JsonSchema)]
pub struct AbuseProtectionConfig {
    /// Rejections within `window` that trigger a ban
    #[serde(default = "_default_max_rejections")]
    pub max_rejections: u32,

    #[serde(default = "_default_rejection_window", with = "humantime_serde")]
    #[schemars(with = "String")]
    pub window: Duration,

    #[serde(default = "_default_initial_ban_length_hours")]
    pub initial_ban_length_hours: f64,

    #[serde(default = "_default_ban_length_multiplier")]
    pub ban_length_multiplier: f64,

    #[serde(default)]
    pub expiry_policy: BanExpiryPolicy,

    #[serde(default)]
    pub blocked_message: Option<String>,
}

impl AbuseProtectionConfig {
    pub fn blocked_message(&self) -> String {
        self.blocked_message
            .clone()
            .unwrap_or_else(|| DEFAULT_BLOCKED_MESSAGE.to_owned())
    }
}

impl Default for AbuseProtectionConfig {
    fn default() -> Self {
        Self {
            max_rejections: _default_max_rejections(),
            window: _default_rejection_window(),
            initial_ban_length_hours: _default_initial_ban_length_hours(),
            ban_length_multiplier: _default_ban_length_multiplier(),
            expiry_policy: BanExpiryPolicy::default(),
            blocked_message: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct TrailguardConfigStore {
    #[serde(default = "_default_database_url")]
    #[schemars(with = "String")]
    pub database_url: Secret<String>,

    #[serde(default)]
    pub plausibility: PlausibilityConfig,

    #[serde(default)]
    pub abuse_protection: AbuseProtectionConfig,
}

impl Default for TrailguardConfigStore {
    fn default() -> Self {
        Self {
            database_url: _default_database_url(),
            plausibility: <_>::default(),
            abuse_protection: <_>::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrailguardConfig {
    pub store: TrailguardConfigStore,
    pub paths_relative_to: PathBuf,
}

impl TrailguardConfig {
    pub fn validate(&self) -> Result<(), TrailguardError> {
        let p = &self.store.plausibility;
        if p.history_len < 2 {
            return Err(TrailguardError::InvalidConfig(
                "plausibility.history_len must be at least 2".into(),
            ));
        }
        for (name, value) in [
            ("insane_speed_kmh", p.insane_speed_kmh),
            ("long_haul_distance_km", p.long_haul_distance_km),
            ("max_air_speed_kmh", p.max_air_speed_kmh),
            ("max_ground_speed_kmh", p.max_ground_speed_kmh),
            ("acceleration_multiplier", p.acceleration_multiplier),
            ("deceleration_divisor", p.deceleration_divisor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrailguardError::InvalidConfig(format!(
                    "plausibility.{name} must be a positive number"
                )));
            }
        }
        if p.max_air_speed_kmh > p.insane_speed_kmh {
            tracing::warn!(
                max_air_speed_kmh = p.max_air_speed_kmh,
                insane_speed_kmh = p.insane_speed_kmh,
                "max_air_speed_kmh is above insane_speed_kmh and will never apply"
            );
        }

        let a = &self.store.abuse_protection;
        if a.max_rejections == 0 {
            return Err(TrailguardError::InvalidConfig(
                "abuse_protection.max_rejections must be at least 1".into(),
            ));
        }
        if a.window.is_zero() {
            return Err(TrailguardError::InvalidConfig(
                "abuse_protection.window must not be empty".into(),
            ));
        }
        if !(a.initial_ban_length_hours.is_finite() && a.initial_ban_length_hours > 0.0) {
            return Err(TrailguardError::InvalidConfig(
                "abuse_protection.initial_ban_length_hours must be a positive number".into(),
            ));
        }
        if !(a.ban_length_multiplier.is_finite() && a.ban_length_multiplier > 1.0) {
            return Err(TrailguardError::InvalidConfig(
                "abuse_protection.ban_length_multiplier must be greater than 1".into(),
            ));
        }
        Ok(())
    }
}
