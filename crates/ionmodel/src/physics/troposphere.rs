//! Tropospheric bending after ITU-R P.834.

/// Apparent-elevation bending in degrees for an elevation `el_deg` seen
/// from `height_km` above sea level.
pub fn tropospheric_bending_deg(el_deg: f64, height_km: f64) -> f64 {
    let theta = el_deg.max(0.0);
    let h = height_km.max(0.0);
    1.0 / (1.314
        + 0.6437 * theta
        + 0.02869 * theta * theta
        + h * (0.2305 + 0.09428 * theta + 0.01096 * theta * theta)
        + 0.008583 * h * h)
}

/// Elevation corrected for tropospheric bending, never below the horizon.
pub fn apply_troposphere(el_deg: f64, height_km: f64) -> f64 {
    (el_deg - tropospheric_bending_deg(el_deg, height_km)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_bending() {
        // About 0.76 deg at sea level on the horizon
        let tau = tropospheric_bending_deg(0.0, 0.0);
        assert!((tau - 1.0 / 1.314).abs() < 1e-12);
    }

    #[test]
    fn test_bending_decreases_upwards() {
        assert!(tropospheric_bending_deg(10.0, 0.0) < tropospheric_bending_deg(1.0, 0.0));
        assert!(tropospheric_bending_deg(10.0, 2.0) < tropospheric_bending_deg(10.0, 0.0));
        assert!(tropospheric_bending_deg(90.0, 0.1) < 0.01);
    }

    #[test]
    fn test_corrected_elevation_clamped() {
        assert_eq!(apply_troposphere(0.2, 0.0), 0.0);
        let el = apply_troposphere(45.0, 0.1);
        assert!(el < 45.0 && el > 44.9);
    }
}
