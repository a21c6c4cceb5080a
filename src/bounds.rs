use serde::{Deserialize, Serialize};

const MILES_PER_DEGREE_LAT: f64 = 69.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("north latitude must be greater than south latitude")]
    NorthNotAboveSouth,
    #[error("east longitude must be greater than west longitude")]
    EastNotAboveWest,
    #[error("radius must be a positive number of miles, got {0}")]
    InvalidRadius(f64),
    #[error("coordinate is not a finite number")]
    NotFinite,
}

/// Axis-aligned latitude/longitude box used by the map queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, BoundsError> {
        if ![north, south, east, west].iter().all(|v| v.is_finite()) {
            return Err(BoundsError::NotFinite);
        }
        if north <= south {
            return Err(BoundsError::NorthNotAboveSouth);
        }
        if east <= west {
            return Err(BoundsError::EastNotAboveWest);
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Approximates a circle around a point with its bounding box, using 69
    /// miles per degree of latitude and scaling longitude by cos(lat).
    pub fn around(lat: f64, lng: f64, radius_miles: f64) -> Result<Self, BoundsError> {
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(BoundsError::InvalidRadius(radius_miles));
        }
        if !lat.is_finite() || !lng.is_finite() {
            return Err(BoundsError::NotFinite);
        }
        let lat_offset = radius_miles / MILES_PER_DEGREE_LAT;
        let lng_offset = radius_miles / (MILES_PER_DEGREE_LAT * lat.to_radians().cos());
        Self::new(
            lat + lat_offset,
            lat - lat_offset,
            lng + lng_offset,
            lng - lng_offset,
        )
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat <= self.north && lat >= self.south && lng <= self.east && lng >= self.west
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_boxes() {
        assert_eq!(
            GeoBounds::new(40.0, 41.0, -73.0, -74.0),
            Err(BoundsError::NorthNotAboveSouth)
        );
        assert_eq!(
            GeoBounds::new(41.0, 40.0, -74.0, -73.0),
            Err(BoundsError::EastNotAboveWest)
        );
        assert_eq!(
            GeoBounds::new(f64::NAN, 40.0, -73.0, -74.0),
            Err(BoundsError::NotFinite)
        );
    }

    #[test]
    fn radius_box_is_centered() {
        let bounds = GeoBounds::around(40.75, -73.98, 6.9).expect("bounds");
        assert!((bounds.north - 40.85).abs() < 1e-9);
        assert!((bounds.south - 40.65).abs() < 1e-9);
        assert!(bounds.east > -73.98 && bounds.west < -73.98);
        // a degree of longitude is shorter than a degree of latitude here
        assert!(bounds.east - bounds.west > bounds.north - bounds.south);
        assert!(bounds.contains(40.75, -73.98));
        assert!(!bounds.contains(40.9, -73.98));
    }

    #[test]
    fn radius_must_be_positive() {
        assert_eq!(
            GeoBounds::around(40.75, -73.98, 0.0),
            Err(BoundsError::InvalidRadius(0.0))
        );
    }
}
