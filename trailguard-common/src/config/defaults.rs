use std::time::Duration;

use crate::Secret;

#[inline]
pub(crate) fn _default_database_url() -> Secret<String> {
    Secret::new("sqlite:data/db".to_owned())
}

pub(crate) const fn _default_history_len() -> usize {
    3
}

pub(crate) const fn _default_insane_speed_kmh() -> f64 {
    1000.0
}

pub(crate) const fn _default_long_haul_distance_km() -> f64 {
    300.0
}

/// Cruising speed of a commercial airliner, with some headroom
pub(crate) const fn _default_max_air_speed_kmh() -> f64 {
    900.0
}

pub(crate) const fn _default_max_ground_speed_kmh() -> f64 {
    150.0
}

pub(crate) const fn _default_acceleration_multiplier() -> f64 {
    2.5
}

pub(crate) const fn _default_deceleration_min_average_kmh() -> f64 {
    10.0
}

pub(crate) const fn _default_deceleration_divisor() -> f64 {
    5.0
}

pub(crate) const fn _default_max_rejections() -> u32 {
    10
}

#[inline]
pub(crate) fn _default_rejection_window() -> Duration {
    Duration::from_secs(60 * 60 * 24)
}

/// 15 minutes
pub(crate) const fn _default_initial_ban_length_hours() -> f64 {
    0.25
}

pub(crate) const fn _default_ban_length_multiplier() -> f64 {
    2.0
}
