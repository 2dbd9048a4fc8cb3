//! Test data generators for creating synthetic ionosphere-like data.
//!
//! These generators create predictable, verifiable vertical profiles and
//! lattice buffers that can be used across the test suite.

/// Evenly spaced values over `[start, end]`, both ends included.
///
/// A single value is placed at the midpoint.
///
/// # Example
///
/// ```
/// use test_utils::linspace;
///
/// assert_eq!(linspace(60.0, 90.0, 4), vec![60.0, 70.0, 80.0, 90.0]);
/// assert_eq!(linspace(60.0, 90.0, 1), vec![75.0]);
/// ```
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![(start + end) / 2.0],
        _ => (0..n)
            .map(|i| {
                if i + 1 == n {
                    end
                } else {
                    start + (end - start) * i as f64 / (n - 1) as f64
                }
            })
            .collect(),
    }
}

/// Creates an alpha-Chapman density profile with the sun overhead.
///
/// # Arguments
///
/// * `heights_km` - Sample altitudes
/// * `peak_density` - Density at the peak, m^-3
/// * `peak_height_km` - Altitude of the peak
/// * `scale_height_km` - Scale height
///
/// # Example
///
/// ```
/// use test_utils::chapman_profile;
///
/// let profile = chapman_profile(&[250.0, 300.0, 350.0], 1.0e12, 300.0, 50.0);
/// assert_eq!(profile[1], 1.0e12);
/// assert!(profile[0] < profile[1] && profile[2] < profile[1]);
/// ```
pub fn chapman_profile(
    heights_km: &[f64],
    peak_density: f64,
    peak_height_km: f64,
    scale_height_km: f64,
) -> Vec<f64> {
    heights_km
        .iter()
        .map(|h| {
            let z = (h - peak_height_km) / scale_height_km;
            peak_density * (0.5 * (1.0 - z - (-z).exp())).exp()
        })
        .collect()
}

/// Creates a lattice buffer in `[time, pixel, altitude]` order with
/// predictable values.
///
/// Each value is calculated as: `t * 1_000_000 + p * 1000 + a`
///
/// # Example
///
/// ```
/// use test_utils::create_lattice_buffer;
///
/// let buf = create_lattice_buffer(2, 3, 4);
/// assert_eq!(buf.len(), 24);
/// assert_eq!(buf[4], 1000.0);      // t=0, p=1, a=0
/// assert_eq!(buf[12], 1_000_000.0); // t=1, p=0, a=0
/// ```
pub fn create_lattice_buffer(n_times: usize, n_pixels: usize, n_altitudes: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(n_times * n_pixels * n_altitudes);
    for t in 0..n_times {
        for p in 0..n_pixels {
            for a in 0..n_altitudes {
                data.push((t * 1_000_000 + p * 1000 + a) as f64);
            }
        }
    }
    data
}

/// Creates a profile with NaN values at specific indices.
///
/// Useful for checking that non-physical samples are rejected.
pub fn create_profile_with_nans(values: &[f64], nan_indices: &[usize]) -> Vec<f64> {
    let mut data = values.to_vec();
    for &idx in nan_indices {
        if idx < data.len() {
            data[idx] = f64::NAN;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(150.0, 500.0, 30);
        assert_eq!(v.len(), 30);
        assert_eq!(v[0], 150.0);
        assert_eq!(v[29], 500.0);
        assert!(v.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_chapman_profile_peak() {
        let heights = linspace(100.0, 500.0, 41);
        let profile = chapman_profile(&heights, 1.0e12, 300.0, 60.0);
        let peak = profile
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| heights[i])
            .unwrap();
        assert_eq!(peak, 300.0);
    }

    #[test]
    fn test_profile_with_nans() {
        let data = create_profile_with_nans(&[1.0, 2.0, 3.0], &[1, 7]);
        assert!(data[1].is_nan());
        assert_eq!(data[2], 3.0);
    }
}
