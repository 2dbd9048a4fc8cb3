//! Dense per-layer arrays indexed by `[time, pixel, altitude]`.

use crate::error::{IonModelError, Result};
use crate::types::{Layer, Quantity};

/// Density and temperature of one layer, row-major `[time, pixel, altitude]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGrid {
    n_times: usize,
    n_pixels: usize,
    n_altitudes: usize,
    density: Vec<f64>,
    temperature: Vec<f64>,
}

impl LayerGrid {
    /// Wrap sampled buffers, checking their length against the shape.
    pub fn new(
        n_times: usize,
        n_pixels: usize,
        n_altitudes: usize,
        density: Vec<f64>,
        temperature: Vec<f64>,
    ) -> Result<Self> {
        let expected = n_times * n_pixels * n_altitudes;
        if density.len() != expected || temperature.len() != expected {
            return Err(IonModelError::configuration(format!(
                "grid buffers hold {} and {} values, expected {} for shape [{}, {}, {}]",
                density.len(),
                temperature.len(),
                expected,
                n_times,
                n_pixels,
                n_altitudes
            )));
        }
        Ok(Self {
            n_times,
            n_pixels,
            n_altitudes,
            density,
            temperature,
        })
    }

    /// `(n_times, n_pixels, n_altitudes)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_times, self.n_pixels, self.n_altitudes)
    }

    pub fn n_times(&self) -> usize {
        self.n_times
    }

    #[inline]
    fn offset(&self, t: usize, p: usize, a: usize) -> usize {
        (t * self.n_pixels + p) * self.n_altitudes + a
    }

    /// Stored density; indices must be in bounds.
    pub fn density(&self, t: usize, p: usize, a: usize) -> f64 {
        self.density[self.offset(t, p, a)]
    }

    /// Stored temperature; indices must be in bounds.
    pub fn temperature(&self, t: usize, p: usize, a: usize) -> f64 {
        self.temperature[self.offset(t, p, a)]
    }

    pub fn value(&self, quantity: Quantity, t: usize, p: usize, a: usize) -> f64 {
        match quantity {
            Quantity::Density => self.density(t, p, a),
            Quantity::Temperature => self.temperature(t, p, a),
        }
    }

    /// Flat buffer of one quantity.
    pub fn values(&self, quantity: Quantity) -> &[f64] {
        match quantity {
            Quantity::Density => &self.density,
            Quantity::Temperature => &self.temperature,
        }
    }

    /// All pixels and altitudes of one instant.
    pub fn time_slab(&self, quantity: Quantity, t: usize) -> &[f64] {
        let len = self.n_pixels * self.n_altitudes;
        &self.values(quantity)[t * len..(t + 1) * len]
    }

    /// Insert instant `t` of `other` as instant `index` of `self`.
    pub fn insert_time(&mut self, index: usize, other: &LayerGrid, t: usize) -> Result<()> {
        if other.n_pixels != self.n_pixels || other.n_altitudes != self.n_altitudes {
            return Err(IonModelError::configuration(format!(
                "cannot insert a [{}, {}] slab into a [{}, {}] grid",
                other.n_pixels, other.n_altitudes, self.n_pixels, self.n_altitudes
            )));
        }
        if index > self.n_times || t >= other.n_times {
            return Err(IonModelError::out_of_range(format!(
                "time index {} outside grid of {} instants",
                index, self.n_times
            )));
        }
        let at = index * self.n_pixels * self.n_altitudes;
        self.density
            .splice(at..at, other.time_slab(Quantity::Density, t).iter().copied());
        self.temperature
            .splice(at..at, other.time_slab(Quantity::Temperature, t).iter().copied());
        self.n_times += 1;
        Ok(())
    }

    /// Index of the first entry that is not a physical sample, as
    /// `(t, p, a)`.
    pub fn first_invalid(&self) -> Option<(usize, usize, usize)> {
        let bad = self
            .density
            .iter()
            .zip(&self.temperature)
            .position(|(&n, &t)| !(n.is_finite() && n >= 0.0 && t.is_finite() && t > 0.0))?;
        let slab = self.n_pixels * self.n_altitudes;
        Some((bad / slab, (bad % slab) / self.n_altitudes, bad % self.n_altitudes))
    }
}

/// Both layer grids of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGrids {
    pub d: LayerGrid,
    pub f: LayerGrid,
}

impl ModelGrids {
    pub fn layer(&self, layer: Layer) -> &LayerGrid {
        match layer {
            Layer::D => &self.d,
            Layer::F => &self.f,
        }
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut LayerGrid {
        match layer {
            Layer::D => &mut self.d,
            Layer::F => &mut self.f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n_times: usize, base: f64) -> LayerGrid {
        let n = n_times * 2 * 3;
        let density = (0..n).map(|i| base + i as f64).collect();
        let temperature = vec![500.0; n];
        LayerGrid::new(n_times, 2, 3, density, temperature).unwrap()
    }

    #[test]
    fn test_row_major_layout() {
        let g = grid(2, 0.0);
        assert_eq!(g.shape(), (2, 2, 3));
        assert_eq!(g.density(0, 0, 0), 0.0);
        assert_eq!(g.density(0, 1, 0), 3.0);
        assert_eq!(g.density(1, 0, 2), 8.0);
        assert_eq!(g.time_slab(Quantity::Density, 1)[0], 6.0);
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(LayerGrid::new(1, 2, 3, vec![0.0; 5], vec![0.0; 6]).is_err());
    }

    #[test]
    fn test_insert_time() {
        let mut g = grid(2, 0.0);
        let extra = grid(1, 100.0);
        g.insert_time(1, &extra, 0).unwrap();
        assert_eq!(g.n_times(), 3);
        assert_eq!(g.density(0, 0, 0), 0.0);
        assert_eq!(g.density(1, 0, 0), 100.0);
        assert_eq!(g.density(2, 0, 0), 6.0);
        assert!(g.insert_time(9, &extra, 0).is_err());
    }

    #[test]
    fn test_first_invalid() {
        let mut density = vec![1.0; 12];
        density[7] = f64::NAN;
        let g = LayerGrid::new(2, 2, 3, density, vec![300.0; 12]).unwrap();
        assert_eq!(g.first_invalid(), Some((1, 0, 1)));
        assert_eq!(grid(1, 0.0).first_invalid(), None);
    }
}
