//! Spatial and vertical sample points of each layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{IonModelError, Result};
use crate::grid::{LayerSpec, SpatialGrid};
use crate::sampler::SamplingJob;
use crate::types::{GeoPoint, Layer};

/// Pixels and altitudes sampled for one layer.
#[derive(Debug, Clone)]
pub struct LayerLattice {
    layer: Layer,
    spec: LayerSpec,
    grid: SpatialGrid,
    altitudes: Vec<f64>,
    pixels: Vec<u64>,
    centers: Vec<GeoPoint>,
    slots: HashMap<u64, usize>,
}

impl LayerLattice {
    /// Pixels within `radius_deg` of `center` (whole sphere for `None`).
    pub fn around(
        layer: Layer,
        spec: LayerSpec,
        grid: SpatialGrid,
        center: &GeoPoint,
        radius_deg: Option<f64>,
    ) -> Self {
        let pixels = grid.query_disc(center, radius_deg);
        Self::assemble(layer, spec, grid, pixels)
    }

    /// Rebuild from a stored pixel list (ascending, unique, in range).
    pub fn from_pixels(
        layer: Layer,
        spec: LayerSpec,
        grid: SpatialGrid,
        pixels: Vec<u64>,
    ) -> Result<Self> {
        if pixels.is_empty() {
            return Err(IonModelError::persistence(format!("{} has no pixels", layer)));
        }
        if pixels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IonModelError::persistence(format!(
                "{} pixel list is not strictly ascending",
                layer
            )));
        }
        if let Some(&bad) = pixels.iter().find(|&&p| p >= grid.npix()) {
            return Err(IonModelError::persistence(format!(
                "{} pixel {} is outside a grid of {} pixels",
                layer,
                bad,
                grid.npix()
            )));
        }
        Ok(Self::assemble(layer, spec, grid, pixels))
    }

    fn assemble(layer: Layer, spec: LayerSpec, grid: SpatialGrid, pixels: Vec<u64>) -> Self {
        let centers = pixels.iter().map(|&p| grid.center(p)).collect();
        let slots = pixels.iter().enumerate().map(|(slot, &p)| (p, slot)).collect();
        Self {
            layer,
            altitudes: spec.altitudes(),
            spec,
            grid,
            pixels,
            centers,
            slots,
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn spec(&self) -> &LayerSpec {
        &self.spec
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Sample altitudes in km, ascending.
    pub fn altitudes(&self) -> &[f64] {
        &self.altitudes
    }

    /// Sampled pixel indices, in storage order.
    pub fn pixels(&self) -> &[u64] {
        &self.pixels
    }

    /// Storage slot of a pixel.
    pub fn slot(&self, pix: u64) -> Result<usize> {
        self.slots.get(&pix).copied().ok_or_else(|| {
            IonModelError::out_of_range(format!(
                "pixel {} is outside the sampled {} disc",
                pix, self.layer
            ))
        })
    }

    /// Storage slot of the pixel containing `point`.
    pub fn locate(&self, point: &GeoPoint) -> Result<usize> {
        self.slot(self.grid.resolve_point(point))
    }

    /// Storage slots and bilinear weights for reading a value at `point`.
    ///
    /// When a weighted neighbour lies outside the disc, the containing
    /// pixel carries the whole weight.
    pub fn interpolation(&self, point: &GeoPoint) -> Result<[(usize, f64); 4]> {
        let home = self.locate(point)?;
        let mut out = [(home, 0.0); 4];
        let weights = self.grid.interpolation_weights(point.lat, point.lon);
        for (entry, (pix, w)) in out.iter_mut().zip(weights) {
            if w <= 0.0 {
                continue;
            }
            match self.slot(pix) {
                Ok(slot) => *entry = (slot, w),
                Err(_) => return Ok([(home, 1.0), (home, 0.0), (home, 0.0), (home, 0.0)]),
            }
        }
        Ok(out)
    }

    /// Sampling job over this lattice at the given instants.
    pub fn job<'a>(&'a self, instants: &'a [DateTime<Utc>]) -> SamplingJob<'a> {
        SamplingJob {
            layer: self.layer,
            instants,
            points: &self.centers,
            altitudes: &self.altitudes,
        }
    }
}

/// Lattices of both layers.
#[derive(Debug, Clone)]
pub struct ModelLattice {
    pub d: LayerLattice,
    pub f: LayerLattice,
}

impl ModelLattice {
    pub fn layer(&self, layer: Layer) -> &LayerLattice {
        match layer {
            Layer::D => &self.d,
            Layer::F => &self.f,
        }
    }
}
