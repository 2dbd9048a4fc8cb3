//! Common test fixtures for ionmodel tests.
//!
//! Fixed instants, observer locations and layer ranges that recur across
//! the test suite, plus temporary directories for persistence tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

/// Common time values for testing.
pub mod time {
    use super::*;

    /// A fixed reference start time (2024-01-15T12:00:00Z)
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";

    /// The reference start time as a timestamp.
    pub fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    /// `hours` after the reference time.
    pub fn hours_after(hours: i64) -> DateTime<Utc> {
        reference() + Duration::hours(hours)
    }

    /// `minutes` after the reference time.
    pub fn minutes_after(minutes: i64) -> DateTime<Utc> {
        reference() + Duration::minutes(minutes)
    }

    /// A three-hour window starting at the reference time.
    pub fn three_hour_window() -> (DateTime<Utc>, DateTime<Utc>) {
        (reference(), hours_after(3))
    }
}

/// Observer locations as `(lat, lon, elevation_m)`.
pub mod observers {
    /// Eastern Ontario, the usual reference site
    pub const OTTAWA: (f64, f64, f64) = (45.0, -75.0, 100.0);

    /// Sea-level equatorial site on the prime meridian
    pub const EQUATOR: (f64, f64, f64) = (0.0, 0.0, 0.0);

    /// High-latitude site close to the pole
    pub const ARCTIC: (f64, f64, f64) = (88.0, 20.0, 0.0);

    /// Longitude given in the [0, 360) convention
    pub const EAST_POSITIVE: (f64, f64, f64) = (-33.9, 287.0, 20.0);
}

/// Layer ranges as `(bottom_km, top_km, n_sublayers)`.
pub mod layers {
    /// Default D layer
    pub const D_DEFAULT: (f64, f64, usize) = (60.0, 90.0, 10);

    /// Default F layer
    pub const F_DEFAULT: (f64, f64, usize) = (150.0, 500.0, 30);

    /// Coarse D layer for fast tests
    pub const D_COARSE: (f64, f64, usize) = (60.0, 90.0, 3);

    /// Coarse F layer for fast tests
    pub const F_COARSE: (f64, f64, usize) = (150.0, 450.0, 4);
}

/// Radio frequencies in MHz.
pub mod frequencies {
    /// HF, strongly affected by the ionosphere
    pub const HF_10: f64 = 10.0;

    /// Low VHF
    pub const VHF_50: f64 = 50.0;

    /// Well above any critical frequency
    pub const VHF_150: f64 = 150.0;
}

/// A temporary directory for saving models, removed on drop.
pub fn model_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("ionmodel-test-")
        .tempdir()
        .expect("failed to create temporary model directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_time_matches_string() {
        let parsed: DateTime<Utc> = time::REFERENCE_TIME.parse().unwrap();
        assert_eq!(parsed, time::reference());
    }

    #[test]
    fn test_window() {
        let (start, end) = time::three_hour_window();
        assert_eq!(end - start, Duration::hours(3));
        assert_eq!(time::minutes_after(90), start + Duration::minutes(90));
    }

    #[test]
    fn test_model_dir_exists() {
        let dir = model_dir();
        assert!(dir.path().is_dir());
    }
}
