//! Ray bending through spherically stratified F-layer shells.

use tracing::debug;

use super::plasma_frequency_sq;

/// Floor applied to the refractive index below the critical frequency.
pub const MIN_REFRACTIVE_INDEX: f64 = 1.0e-3;

/// Refractive index of a cold collisionless plasma, `sqrt(1 - (fp/f)²)`,
/// floored at [`MIN_REFRACTIVE_INDEX`].
pub fn refractive_index(density: f64, freq_hz: f64) -> f64 {
    if !(freq_hz > 0.0) {
        return MIN_REFRACTIVE_INDEX;
    }
    let ratio = plasma_frequency_sq(density) / (freq_hz * freq_hz);
    (1.0 - ratio).max(MIN_REFRACTIVE_INDEX * MIN_REFRACTIVE_INDEX).sqrt()
}

/// Snell's law at an interface; the sine is clamped so total reflection
/// ends at grazing incidence instead of producing NaN.
fn snell(n_from: f64, n_to: f64, incidence: f64) -> (f64, bool) {
    let s = n_from / n_to * incidence.sin();
    (s.clamp(-1.0, 1.0).asin(), s > 1.0)
}

/// Total bending (radians) of a ray leaving the observer at `zenith`.
///
/// `boundaries` holds the N+1 shell radii (km, ascending) and `indices` the
/// refractive index of the N shells between them. The ray enters from
/// vacuum at `boundaries[0]` and leaves to vacuum at `boundaries[N]`.
/// Positive values mean the ray is bent away from the zenith.
pub fn stratified_bending(
    zenith: f64,
    observer_radius_km: f64,
    boundaries: &[f64],
    indices: &[f64],
) -> f64 {
    if indices.is_empty() || boundaries.len() != indices.len() + 1 {
        return 0.0;
    }

    let mut incidence = (observer_radius_km / boundaries[0] * zenith.sin()).clamp(-1.0, 1.0).asin();
    let mut n_prev = 1.0;
    let mut deviation = 0.0;
    let mut reflected = false;

    for (k, &n) in indices.iter().enumerate() {
        let (refracted, total) = snell(n_prev, n, incidence);
        reflected |= total;
        deviation += refracted - incidence;
        incidence = (boundaries[k] / boundaries[k + 1] * refracted.sin()).clamp(-1.0, 1.0).asin();
        n_prev = n;
    }

    let (exit, total) = snell(n_prev, 1.0, incidence);
    reflected |= total;
    deviation += exit - incidence;

    if reflected {
        debug!(zenith_deg = zenith.to_degrees(), "Total reflection inside the F layer");
    }
    deviation
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: f64 = 6378.1;

    fn shells(n: usize) -> Vec<f64> {
        (0..=n).map(|k| R + 150.0 + 50.0 * k as f64).collect()
    }

    #[test]
    fn test_refractive_index() {
        assert_eq!(refractive_index(0.0, 1.0e8), 1.0);
        let n = refractive_index(1.0e12, 50.0e6);
        assert!(n > 0.98 && n < 1.0);
        assert_eq!(refractive_index(1.0e14, 1.0e6), MIN_REFRACTIVE_INDEX);
    }

    #[test]
    fn test_vacuum_does_not_bend() {
        let b = stratified_bending(60f64.to_radians(), R, &shells(4), &[1.0; 4]);
        assert!(b.abs() < 1e-12);
    }

    #[test]
    fn test_zenith_does_not_bend() {
        let b = stratified_bending(0.0, R, &shells(3), &[0.9, 0.8, 0.9]);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_oblique_ray_bends_and_grows_with_density() {
        let z = 70f64.to_radians();
        let at_50mhz = |densities: [f64; 3]| -> Vec<f64> {
            densities.iter().map(|d| refractive_index(*d, 50.0e6)).collect()
        };
        let weak = at_50mhz([1.0e11, 5.0e11, 1.0e11]);
        let strong = at_50mhz([1.0e12, 2.0e12, 1.0e12]);
        let bw = stratified_bending(z, R, &shells(3), &weak);
        let bs = stratified_bending(z, R, &shells(3), &strong);
        assert!(bw.is_finite() && bs.is_finite());
        assert!(bw.abs() > 0.0);
        assert!(bs.abs() > bw.abs());
    }

    #[test]
    fn test_total_reflection_is_finite() {
        let b = stratified_bending(85f64.to_radians(), R, &shells(2), &[MIN_REFRACTIVE_INDEX, 0.5]);
        assert!(b.is_finite());
    }

    #[test]
    fn test_mismatched_shells() {
        assert_eq!(stratified_bending(0.5, R, &shells(2), &[1.0]), 0.0);
    }
}
