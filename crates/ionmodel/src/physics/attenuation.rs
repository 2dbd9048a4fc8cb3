//! Non-deviative absorption in the D layer.

use super::SPEED_OF_LIGHT;
use crate::geometry::EARTH_RADIUS_KM;

/// Attenuation factor of a thin absorbing shell.
///
/// * `freq_hz` - observing frequency
/// * `zenith` - zenith angle of the line of sight, radians
/// * `mid_height_m` - mid-height of the absorbing layer
/// * `thickness_m` - full thickness of the layer
/// * `plasma_freq_hz` - plasma frequency inside the shell
/// * `collision_hz` - electron collision frequency inside the shell
///
/// Returns a factor in (0, 1], 1 meaning no absorption. Degenerate inputs
/// (zero frequencies, non-finite values) give 1.
pub fn d_layer_attenuation(
    freq_hz: f64,
    zenith: f64,
    mid_height_m: f64,
    thickness_m: f64,
    plasma_freq_hz: f64,
    collision_hz: f64,
) -> f64 {
    let radius_m = EARTH_RADIUS_KM * 1.0e3;
    let path = thickness_m
        * (1.0 + mid_height_m / radius_m)
        * (zenith.cos().powi(2) + 2.0 * mid_height_m / radius_m).powf(-0.5);

    let denominator = SPEED_OF_LIGHT * (collision_hz * collision_hz + freq_hz * freq_hz);
    if !(denominator > 0.0) || !path.is_finite() {
        return 1.0;
    }
    let exponent =
        2.0 * std::f64::consts::PI * plasma_freq_hz.powi(2) * collision_hz * path / denominator;
    if !exponent.is_finite() {
        return 1.0;
    }
    (-exponent.max(0.0)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_plasma_no_absorption() {
        assert_eq!(d_layer_attenuation(1.0e7, 0.0, 75.0e3, 30.0e3, 0.0, 1.0e7), 1.0);
    }

    #[test]
    fn test_range_and_monotonicity() {
        let fp = 3.0e5;
        let low = d_layer_attenuation(5.0e6, 0.0, 75.0e3, 30.0e3, fp, 1.5e7);
        let high = d_layer_attenuation(50.0e6, 0.0, 75.0e3, 30.0e3, fp, 1.5e7);
        assert!(low > 0.0 && low < 1.0);
        assert!(high > low, "higher frequencies are absorbed less");

        let slant = d_layer_attenuation(5.0e6, 80f64.to_radians(), 75.0e3, 30.0e3, fp, 1.5e7);
        assert!(slant < low, "longer path absorbs more");
    }

    #[test]
    fn test_degenerate_inputs_are_finite() {
        assert_eq!(d_layer_attenuation(0.0, 0.0, 75.0e3, 30.0e3, 1.0e6, 0.0), 1.0);
        let v = d_layer_attenuation(1.0e7, std::f64::consts::FRAC_PI_2, 0.0, 30.0e3, 1.0e6, 1.0e7);
        assert!(v.is_finite() && (0.0..=1.0).contains(&v));
    }
}
