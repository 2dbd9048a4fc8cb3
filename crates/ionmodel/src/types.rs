//! Core types shared by the model, the sampler and the physics kernel.

use serde::{Deserialize, Serialize};

use crate::error::{IonModelError, Result};

/// Lowest accepted observer elevation in meters (below the Dead Sea shore).
pub const MIN_ELEVATION_M: f64 = -500.0;

/// Geographic position of the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverPosition {
    /// Latitude in degrees, [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, [-180, 360).
    pub lon: f64,
    /// Elevation above sea level in meters.
    pub elevation_m: f64,
}

impl ObserverPosition {
    /// Create a new observer position.
    pub fn new(lat: f64, lon: f64, elevation_m: f64) -> Self {
        Self {
            lat,
            lon,
            elevation_m,
        }
    }

    /// Check the coordinate ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(IonModelError::configuration(format!(
                "observer latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..360.0).contains(&self.lon) {
            return Err(IonModelError::configuration(format!(
                "observer longitude {} is outside [-180, 360)",
                self.lon
            )));
        }
        if !self.elevation_m.is_finite() || self.elevation_m < MIN_ELEVATION_M {
            return Err(IonModelError::configuration(format!(
                "observer elevation {} m is below {} m",
                self.elevation_m, MIN_ELEVATION_M
            )));
        }
        Ok(())
    }

    /// Ground point below the observer.
    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Elevation in kilometers.
    pub fn elevation_km(&self) -> f64 {
        self.elevation_m / 1000.0
    }
}

impl Default for ObserverPosition {
    fn default() -> Self {
        Self::new(45.0, -75.0, 100.0)
    }
}

/// A point on the sphere in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Same point with longitude folded into (-180, 180].
    pub fn normalized(&self) -> Self {
        let mut lon = self.lon.rem_euclid(360.0);
        if lon > 180.0 {
            lon -= 360.0;
        }
        Self {
            lat: self.lat.clamp(-90.0, 90.0),
            lon,
        }
    }

    /// Great-circle distance to another point in degrees.
    pub fn angular_distance_deg(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        (2.0 * a.sqrt().min(1.0).asin()).to_degrees()
    }
}

/// A direction on the observer's sky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyDirection {
    /// Elevation above the horizon in degrees, [0, 90].
    pub el: f64,
    /// Azimuth in degrees, clockwise from north.
    pub az: f64,
}

impl SkyDirection {
    /// Create a new sky direction.
    pub fn new(el: f64, az: f64) -> Self {
        Self { el, az }
    }

    /// Straight up.
    pub fn zenith() -> Self {
        Self::new(90.0, 0.0)
    }

    /// Zenith angle in radians.
    pub fn zenith_angle(&self) -> f64 {
        (90.0 - self.el).to_radians()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.el.is_finite() || !(0.0..=90.0).contains(&self.el) || !self.az.is_finite() {
            return Err(IonModelError::out_of_range(format!(
                "sky direction (el={}, az={}) is not above the horizon",
                self.el, self.az
            )));
        }
        Ok(())
    }
}

/// Ionospheric layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    D,
    F,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::D, Layer::F];

    /// Short name used in progress labels and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::D => "d",
            Self::F => "f",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::D => write!(f, "D layer"),
            Self::F => write!(f, "F layer"),
        }
    }
}

/// Stored physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    /// Electron density in m^-3.
    Density,
    /// Electron temperature in K.
    Temperature,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Density => write!(f, "electron density"),
            Self::Temperature => write!(f, "electron temperature"),
        }
    }
}

/// Where a point query looks.
///
/// A sky direction crosses each sublayer altitude at a different ground
/// point; a geographic target uses the same pixel for every altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Sky(SkyDirection),
    Geo(GeoPoint),
}

impl From<SkyDirection> for Target {
    fn from(dir: SkyDirection) -> Self {
        Self::Sky(dir)
    }
}

impl From<GeoPoint> for Target {
    fn from(point: GeoPoint) -> Self {
        Self::Geo(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_validation() {
        assert!(ObserverPosition::new(45.0, -75.0, 100.0).validate().is_ok());
        assert!(ObserverPosition::new(45.0, 300.0, 0.0).validate().is_ok());
        assert!(ObserverPosition::new(91.0, 0.0, 0.0).validate().is_err());
        assert!(ObserverPosition::new(0.0, 360.0, 0.0).validate().is_err());
        assert!(ObserverPosition::new(0.0, 0.0, -1000.0).validate().is_err());
        assert!(ObserverPosition::new(f64::NAN, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_normalized_longitude() {
        assert_eq!(GeoPoint::new(10.0, 270.0).normalized().lon, -90.0);
        assert_eq!(GeoPoint::new(10.0, 180.0).normalized().lon, 180.0);
        assert_eq!(GeoPoint::new(10.0, -180.0).normalized().lon, 180.0);
        assert_eq!(GeoPoint::new(10.0, -75.0).normalized().lon, -75.0);
    }

    #[test]
    fn test_angular_distance() {
        let a = GeoPoint::new(0.0, 0.0);
        assert!((a.angular_distance_deg(&GeoPoint::new(0.0, 90.0)) - 90.0).abs() < 1e-9);
        assert!((a.angular_distance_deg(&GeoPoint::new(90.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!(a.angular_distance_deg(&a).abs() < 1e-12);
        let b = GeoPoint::new(45.0, 170.0);
        let c = GeoPoint::new(45.0, -190.0);
        assert!(b.angular_distance_deg(&c) < 1e-9);
    }

    #[test]
    fn test_sky_direction_validation() {
        assert!(SkyDirection::zenith().validate().is_ok());
        assert!(SkyDirection::new(0.0, 359.0).validate().is_ok());
        assert!(SkyDirection::new(-1.0, 0.0).validate().is_err());
        assert!(SkyDirection::new(91.0, 0.0).validate().is_err());
    }
}
