//! Great-circle math on a spherical Earth.

use trailguard_common::Coordinates;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

/// Haversine distance between two points in kilometers.
///
/// Inputs are expected to be range-checked already. The result is never
/// negative, including for identical and antipodal points.
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = degrees_to_radians(a.latitude);
    let lon1 = degrees_to_radians(a.longitude);
    let lat2 = degrees_to_radians(b.latitude);
    let lon2 = degrees_to_radians(b.longitude);

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (EARTH_RADIUS_KM * c).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON_KM: f64 = 1e-6;

    #[test]
    fn test_distance_to_self_is_zero() {
        for p in [
            Coordinates::new(0.0, 0.0),
            Coordinates::new(52.52, 13.405),
            Coordinates::new(-90.0, 180.0),
            Coordinates::new(89.9999, -179.9999),
        ] {
            assert_eq!(distance_km(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let points = [
            Coordinates::new(52.52, 13.405),
            Coordinates::new(40.7128, -74.006),
            Coordinates::new(-33.8688, 151.2093),
            Coordinates::new(0.0, 180.0),
            Coordinates::new(-90.0, 0.0),
        ];
        for a in &points {
            for b in &points {
                assert!((distance_km(a, b) - distance_km(b, a)).abs() < EPSILON_KM);
            }
        }
    }

    #[test]
    fn test_known_distance() {
        // Berlin to Paris is roughly 878 km
        let berlin = Coordinates::new(52.52, 13.405);
        let paris = Coordinates::new(48.8566, 2.3522);
        let d = distance_km(&berlin, &paris);
        assert!((d - 877.5).abs() < 2.0, "got {d}");
    }

    #[test]
    fn test_antipodal_points_are_half_circumference() {
        let d = distance_km(&Coordinates::new(0.0, 0.0), &Coordinates::new(0.0, 180.0));
        assert!(d >= 0.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-3);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance_km(&Coordinates::new(10.0, 5.0), &Coordinates::new(11.0, 5.0));
        assert!((d - degrees_to_radians(1.0) * EARTH_RADIUS_KM).abs() < EPSILON_KM);
    }
}
