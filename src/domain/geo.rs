//! Proximity verification between a reported GPS fix and a destination.
//!
//! Distances use the haversine great-circle formula on a spherical Earth
//! of radius [`EARTH_RADIUS_METERS`]. All functions are pure.

use serde::{Deserialize, Serialize};

use crate::error::RewardsError;

/// Mean Earth radius used for great-circle distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Builds a position, rejecting values outside `[-90, 90]` latitude or
    /// `[-180, 180]` longitude, and non-finite input.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::InvalidRequest`] for out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, RewardsError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(RewardsError::InvalidRequest(format!(
                "latitude must be within [-90, 90], got {latitude}"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(RewardsError::InvalidRequest(format!(
                "longitude must be within [-180, 180], got {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other`, in meters.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine distance between two points given in decimal degrees.
#[must_use]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` marginally above 1 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Returns `true` when the user position lies within `radius_meters` of
/// the destination (the boundary counts as inside).
#[must_use]
pub fn is_within_radius(
    dest_lat: f64,
    dest_lon: f64,
    user_lat: f64,
    user_lon: f64,
    radius_meters: f64,
) -> bool {
    distance_meters(dest_lat, dest_lon, user_lat, user_lon) <= radius_meters
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const MANILA: (f64, f64) = (14.5995, 120.9842);

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(distance_meters(MANILA.0, MANILA.1, MANILA.0, MANILA.1), 0.0);
        assert_eq!(distance_meters(-33.9, 151.2, -33.9, 151.2), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            ((14.5995, 120.9842), (14.6042, 120.9822)),
            ((51.5007, -0.1246), (48.8584, 2.2945)),
            ((-89.0, 179.9), (89.0, -179.9)),
        ];
        for ((a_lat, a_lon), (b_lat, b_lon)) in pairs {
            let ab = distance_meters(a_lat, a_lon, b_lat, b_lon);
            let ba = distance_meters(b_lat, b_lon, a_lat, a_lon);
            assert!((ab - ba).abs() < 1e-6);
        }
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn radius_check_at_destination_and_500m_away() {
        assert!(is_within_radius(MANILA.0, MANILA.1, MANILA.0, MANILA.1, 100.0));
        // ~0.0045 degrees of latitude is about 500 m.
        let far_lat = MANILA.0 + 0.0045;
        assert!(!is_within_radius(MANILA.0, MANILA.1, far_lat, MANILA.1, 100.0));
    }

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(Coordinates::new(90.5, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.1).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn coordinates_distance_matches_free_function() {
        let Ok(a) = Coordinates::new(MANILA.0, MANILA.1) else {
            panic!("valid coordinates");
        };
        let Ok(b) = Coordinates::new(14.6042, 120.9822) else {
            panic!("valid coordinates");
        };
        assert_eq!(
            a.distance_to(&b),
            distance_meters(MANILA.0, MANILA.1, 14.6042, 120.9822)
        );
    }
}
