//! Check-in destinations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DestinationId;
use super::geo::Coordinates;
use crate::error::RewardsError;

/// A physical place users check in at by scanning its QR code on site.
///
/// Destinations are never depleted by visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Destination identifier.
    pub id: DestinationId,
    /// Display name.
    pub name: String,
    /// Category slug (e.g. `"beach"`), used by category badges.
    pub category: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Allowed check-in distance in meters; `None` uses the configured default.
    pub visit_radius_m: Option<f64>,
    /// Base points for a check-in.
    pub points_reward: i64,
    /// Unique QR token printed at the destination.
    pub qr_code: String,
    /// Inactive destinations cannot be checked in to.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Destination {
    /// Registered position of the destination.
    ///
    /// # Errors
    ///
    /// Returns [`RewardsError::InvalidRequest`] if the stored coordinates
    /// are out of range.
    pub fn coordinates(&self) -> Result<Coordinates, RewardsError> {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Radius to enforce, falling back to `default_m` when unset or not positive.
    #[must_use]
    pub fn effective_radius(&self, default_m: f64) -> f64 {
        match self.visit_radius_m {
            Some(radius) if radius > 0.0 => radius,
            _ => default_m,
        }
    }

    /// Whether a scanned token names this destination. Comparison ignores
    /// surrounding whitespace and ASCII case.
    #[must_use]
    pub fn matches_code(&self, scanned: &str) -> bool {
        normalize_code(scanned) == normalize_code(&self.qr_code)
    }
}

/// Canonical form of a QR token used for lookups.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(radius: Option<f64>) -> Destination {
        Destination {
            id: DestinationId::new(),
            name: "Rizal Park".to_string(),
            category: "park".to_string(),
            latitude: 14.5831,
            longitude: 120.9794,
            visit_radius_m: radius,
            points_reward: 50,
            qr_code: "RIZAL-PARK-01".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn radius_falls_back_to_default() {
        assert_eq!(destination(None).effective_radius(100.0), 100.0);
        assert_eq!(destination(Some(0.0)).effective_radius(100.0), 100.0);
        assert_eq!(destination(Some(250.0)).effective_radius(100.0), 250.0);
    }

    #[test]
    fn code_matching_ignores_case_and_padding() {
        let d = destination(None);
        assert!(d.matches_code("rizal-park-01"));
        assert!(d.matches_code("  RIZAL-PARK-01\n"));
        assert!(!d.matches_code("RIZAL-PARK-02"));
    }
}
