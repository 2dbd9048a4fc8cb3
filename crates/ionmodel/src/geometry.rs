//! Line-of-sight geometry on a spherical Earth.

use crate::types::{GeoPoint, ObserverPosition, SkyDirection};

/// Earth radius used throughout the model, km.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// Distance along the line of sight from the observer to the shell at
/// `alt_km`, for a zenith angle in radians. Both in km.
pub fn slant_range(zenith: f64, alt_km: f64, observer_alt_km: f64) -> f64 {
    let r0 = EARTH_RADIUS_KM + observer_alt_km;
    let r = EARTH_RADIUS_KM + alt_km;
    (r * r - (r0 * zenith.sin()).powi(2)).max(0.0).sqrt() - r0 * zenith.cos()
}

/// Earth-central angle (radians) between the observer and the point where
/// the line of sight crosses the shell at `alt_km`.
pub fn central_angle(zenith: f64, alt_km: f64, observer_alt_km: f64) -> f64 {
    let r0 = EARTH_RADIUS_KM + observer_alt_km;
    let r = EARTH_RADIUS_KM + alt_km;
    let zenith_at_shell = (r0 / r * zenith.sin()).clamp(-1.0, 1.0).asin();
    (zenith - zenith_at_shell).max(0.0)
}

/// Geographic sub-point of the line of sight at altitude `alt_km`.
pub fn sky_to_ground(observer: &ObserverPosition, dir: &SkyDirection, alt_km: f64) -> GeoPoint {
    let gamma = central_angle(dir.zenith_angle(), alt_km, observer.elevation_km());
    destination(&observer.geo(), dir.az.to_radians(), gamma)
}

/// Great-circle destination from `start` along `bearing` over `angle` (radians).
pub fn destination(start: &GeoPoint, bearing: f64, angle: f64) -> GeoPoint {
    let phi1 = start.lat.to_radians();
    let lambda1 = start.lon.to_radians();
    let sin_phi2 = phi1.sin() * angle.cos() + phi1.cos() * angle.sin() * bearing.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (bearing.sin() * angle.sin() * phi1.cos()).atan2(angle.cos() - phi1.sin() * sin_phi2);
    GeoPoint::new(phi2.to_degrees(), lambda2.to_degrees()).normalized()
}

/// Elevation/azimuth mesh covering the visible sky.
///
/// Returns `gridsize²` pairs, azimuth-major: elevations run 0..=90° and
/// azimuths 0..=360° with `gridsize` steps each.
pub fn elaz_mesh(gridsize: usize) -> (Vec<f64>, Vec<f64>) {
    let steps = |max: f64| -> Vec<f64> {
        match gridsize {
            0 => Vec::new(),
            1 => vec![max / 2.0],
            n => (0..n).map(|i| max * i as f64 / (n - 1) as f64).collect(),
        }
    };
    let (els, azs) = (steps(90.0), steps(360.0));
    let mut el_mesh = Vec::with_capacity(gridsize * gridsize);
    let mut az_mesh = Vec::with_capacity(gridsize * gridsize);
    for &az in &azs {
        for &el in &els {
            el_mesh.push(el);
            az_mesh.push(az);
        }
    }
    (el_mesh, az_mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zenith_slant_range_is_altitude() {
        assert!((slant_range(0.0, 300.0, 0.0) - 300.0).abs() < 1e-9);
        assert!((slant_range(0.0, 300.0, 0.1) - 299.9).abs() < 1e-9);
    }

    #[test]
    fn test_horizon_slant_range() {
        let expected = ((EARTH_RADIUS_KM + 80.0).powi(2) - EARTH_RADIUS_KM.powi(2)).sqrt();
        let s = slant_range(std::f64::consts::FRAC_PI_2, 80.0, 0.0);
        assert!((s - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zenith_ground_point_is_observer() {
        let obs = ObserverPosition::new(45.0, -75.0, 100.0);
        let p = sky_to_ground(&obs, &SkyDirection::zenith(), 300.0);
        assert!((p.lat - 45.0).abs() < 1e-9);
        assert!((p.lon + 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_northward_look_moves_north() {
        let obs = ObserverPosition::new(10.0, 20.0, 0.0);
        let p = sky_to_ground(&obs, &SkyDirection::new(30.0, 0.0), 300.0);
        assert!(p.lat > 10.0);
        assert!((p.lon - 20.0).abs() < 1e-9);
        let east = sky_to_ground(&obs, &SkyDirection::new(30.0, 90.0), 300.0);
        assert!(east.lon > 20.0);
    }

    #[test]
    fn test_horizon_reach_fits_view_discs() {
        // The default view radii (12 and 24 deg) cover the horizon at the layer tops
        assert!(central_angle(std::f64::consts::FRAC_PI_2, 90.0, 0.0).to_degrees() < 12.0);
        assert!(central_angle(std::f64::consts::FRAC_PI_2, 500.0, 0.0).to_degrees() < 24.0);
    }

    #[test]
    fn test_elaz_mesh() {
        let (el, az) = elaz_mesh(4);
        assert_eq!(el.len(), 16);
        assert_eq!(az.len(), 16);
        assert_eq!(el[0], 0.0);
        assert_eq!(el[3], 90.0);
        assert_eq!(az[15], 360.0);
    }
}
