//! Stateless physics kernel: plasma frequency, collision frequency,
//! D-layer absorption, tropospheric and ionospheric refraction.

mod attenuation;
mod collision;
mod refraction;
mod troposphere;

pub use attenuation::d_layer_attenuation;
pub use collision::CollisionModel;
pub use refraction::{refractive_index, stratified_bending, MIN_REFRACTIVE_INDEX};
pub use troposphere::{apply_troposphere, tropospheric_bending_deg};

/// Elementary charge, C.
pub const ELECTRON_CHARGE: f64 = 1.602_176_634e-19;
/// Electron mass, kg.
pub const ELECTRON_MASS: f64 = 9.109_383_701_5e-31;
/// Vacuum permittivity, F/m.
pub const EPSILON_0: f64 = 8.854_187_812_8e-12;
/// Speed of light, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Squared plasma frequency in Hz² for an electron density in m^-3.
///
/// Negative densities are treated as zero.
pub fn plasma_frequency_sq(density: f64) -> f64 {
    let omega_sq =
        density.max(0.0) * ELECTRON_CHARGE * ELECTRON_CHARGE / (ELECTRON_MASS * EPSILON_0);
    omega_sq / (4.0 * std::f64::consts::PI * std::f64::consts::PI)
}

/// Plasma frequency in Hz.
pub fn plasma_frequency(density: f64) -> f64 {
    plasma_frequency_sq(density).sqrt()
}

/// Megahertz to hertz.
pub fn mhz_to_hz(freq_mhz: f64) -> f64 {
    freq_mhz * 1.0e6
}
