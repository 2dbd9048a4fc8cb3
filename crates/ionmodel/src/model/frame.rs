//! Snapshot of both layers at one instant.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::time_axis::TimeBracket;
use crate::types::{Layer, ObserverPosition, Quantity, SkyDirection, Target};

use super::grids::{LayerGrid, ModelGrids};
use super::lattice::{LayerLattice, ModelLattice};
use super::query::{self, LayerFields, QueryOptions};

#[derive(Debug, Clone, PartialEq)]
struct FrameLayer {
    n_altitudes: usize,
    density: Vec<f64>,
    temperature: Vec<f64>,
}

impl FrameLayer {
    fn blend(grid: &LayerGrid, bracket: TimeBracket) -> Self {
        let (lo, hi) = bracket.indices();
        let mix = |q: Quantity| -> Vec<f64> {
            grid.time_slab(q, lo)
                .iter()
                .zip(grid.time_slab(q, hi))
                .map(|(&a, &b)| bracket.blend(a, b))
                .collect()
        };
        Self {
            n_altitudes: grid.shape().2,
            density: mix(Quantity::Density),
            temperature: mix(Quantity::Temperature),
        }
    }

    fn values(&self, quantity: Quantity) -> &[f64] {
        match quantity {
            Quantity::Density => &self.density,
            Quantity::Temperature => &self.temperature,
        }
    }
}

/// Density and temperature of both layers at one instant.
///
/// Answers the same point queries as the model, without time lookup.
#[derive(Debug, Clone)]
pub struct IonFrame {
    time: DateTime<Utc>,
    observer: ObserverPosition,
    lattice: Arc<ModelLattice>,
    d: FrameLayer,
    f: FrameLayer,
}

impl IonFrame {
    pub(crate) fn from_grids(
        time: DateTime<Utc>,
        observer: ObserverPosition,
        lattice: Arc<ModelLattice>,
        grids: &ModelGrids,
        bracket: TimeBracket,
    ) -> Self {
        Self {
            time,
            observer,
            lattice,
            d: FrameLayer::blend(&grids.d, bracket),
            f: FrameLayer::blend(&grids.f, bracket),
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Raw values of one layer, row-major `[pixel, altitude]` over
    /// [`LayerLattice::pixels`].
    pub fn values(&self, layer: Layer, quantity: Quantity) -> &[f64] {
        self.frame_layer(layer).values(quantity)
    }

    pub fn lattice(&self, layer: Layer) -> &LayerLattice {
        self.lattice.layer(layer)
    }

    fn frame_layer(&self, layer: Layer) -> &FrameLayer {
        match layer {
            Layer::D => &self.d,
            Layer::F => &self.f,
        }
    }

    /// D-layer electron density.
    pub fn ded(&self, target: impl Into<Target>, options: &QueryOptions) -> Result<f64> {
        self.value(Layer::D, Quantity::Density, target, options)
    }

    /// D-layer electron temperature.
    pub fn det(&self, target: impl Into<Target>, options: &QueryOptions) -> Result<f64> {
        self.value(Layer::D, Quantity::Temperature, target, options)
    }

    /// F-layer electron density.
    pub fn fed(&self, target: impl Into<Target>, options: &QueryOptions) -> Result<f64> {
        self.value(Layer::F, Quantity::Density, target, options)
    }

    /// F-layer electron temperature.
    pub fn fet(&self, target: impl Into<Target>, options: &QueryOptions) -> Result<f64> {
        self.value(Layer::F, Quantity::Temperature, target, options)
    }

    pub fn value(
        &self,
        layer: Layer,
        quantity: Quantity,
        target: impl Into<Target>,
        options: &QueryOptions,
    ) -> Result<f64> {
        query::value(self, layer, quantity, &target.into(), options.layer)
    }

    pub fn profile(
        &self,
        layer: Layer,
        quantity: Quantity,
        target: impl Into<Target>,
    ) -> Result<Vec<f64>> {
        query::profile(self, layer, quantity, &target.into())
    }

    pub fn atten(&self, dir: SkyDirection, freq_mhz: f64, options: &QueryOptions) -> Result<f64> {
        query::attenuation(self, &dir, freq_mhz, options)
    }

    pub fn atten_profile(
        &self,
        dir: SkyDirection,
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<Vec<f64>> {
        query::attenuation_profile(self, &dir, freq_mhz, options)
    }

    pub fn refr(&self, dir: SkyDirection, freq_mhz: f64, options: &QueryOptions) -> Result<f64> {
        query::refraction(self, &dir, freq_mhz, options)
    }

    pub fn refracted_elevation(
        &self,
        dir: SkyDirection,
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<f64> {
        query::refracted_elevation(self, &dir, freq_mhz, options)
    }
}

impl LayerFields for IonFrame {
    fn observer(&self) -> &ObserverPosition {
        &self.observer
    }

    fn lattice(&self, layer: Layer) -> &LayerLattice {
        self.lattice.layer(layer)
    }

    fn sample(&self, layer: Layer, quantity: Quantity, slot: usize, alt_index: usize) -> f64 {
        let frame = self.frame_layer(layer);
        frame.values(quantity)[slot * frame.n_altitudes + alt_index]
    }
}
