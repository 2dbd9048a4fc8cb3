//! The model orchestrator.
//!
//! Construction is split in two phases. [`IonModel::build`] validates the
//! configuration and lays out the lattice without touching the data source;
//! [`PendingModel::compute`] fills the grids through the parallel sampler.
//! [`IonModel::new`] runs both.
//!
//! The time axis and the grids live behind one `RwLock`. Point queries take
//! the read lock; on-demand extension (`recalc`) samples the missing
//! instants outside the lock and splices them in under the write lock.

mod frame;
mod grids;
mod lattice;
mod query;

pub use frame::IonFrame;
pub use grids::{LayerGrid, ModelGrids};
pub use lattice::{LayerLattice, ModelLattice};
pub use query::QueryOptions;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::error::{IonModelError, Result};
use crate::grid::SpatialGrid;
use crate::sampler::{ParallelSampler, Progress, TracingProgress};
use crate::source::IonosphereSource;
use crate::time_axis::{TimeAxis, TimeBracket};
use crate::types::{Layer, ObserverPosition, Quantity, SkyDirection, Target};

use query::LayerFields;

/// A validated model whose grids have not been computed yet.
#[derive(Debug, Clone)]
pub struct PendingModel {
    config: ModelConfig,
    lattice: ModelLattice,
    axis: TimeAxis,
}

impl PendingModel {
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.axis
    }

    pub fn lattice(&self, layer: Layer) -> &LayerLattice {
        self.lattice.layer(layer)
    }

    /// Number of source coordinates the computation will evaluate.
    pub fn sample_count(&self) -> usize {
        Layer::ALL
            .iter()
            .map(|&l| self.lattice(l).job(self.axis.instants()).samples())
            .sum()
    }

    /// Fill the grids, logging progress through `tracing`.
    pub fn compute<S: IonosphereSource + 'static>(self, source: S) -> Result<IonModel> {
        self.compute_with_progress(source, &TracingProgress)
    }

    /// Fill the grids, reporting progress to `progress`.
    pub fn compute_with_progress<S: IonosphereSource + 'static>(
        self,
        source: S,
        progress: &dyn Progress,
    ) -> Result<IonModel> {
        let source: Arc<dyn IonosphereSource> = Arc::new(source);
        let started = Instant::now();
        info!(
            source = %source.name(),
            times = self.axis.len(),
            d_pixels = self.lattice.d.pixels().len(),
            f_pixels = self.lattice.f.pixels().len(),
            samples = self.sample_count(),
            "Computing ionosphere model"
        );

        let sampler = ParallelSampler::new(source.as_ref(), self.config.retries)
            .with_progress(progress)
            .with_label(self.config.pbar_desc.clone());
        let grids = ModelGrids {
            d: sampler.sample_layer(&self.lattice.d.job(self.axis.instants()))?,
            f: sampler.sample_layer(&self.lattice.f.job(self.axis.instants()))?,
        };

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Ionosphere model computed");
        Ok(IonModel::assemble(self.config, self.lattice, self.axis, grids, Some(source)))
    }
}

pub(crate) struct ModelState {
    pub(crate) axis: TimeAxis,
    pub(crate) grids: ModelGrids,
}

/// Precomputed ionosphere over an observer and a time window.
pub struct IonModel {
    config: ModelConfig,
    lattice: Arc<ModelLattice>,
    state: RwLock<ModelState>,
    source: Option<Arc<dyn IonosphereSource>>,
}

impl std::fmt::Debug for IonModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IonModel")
            .field("config", &self.config)
            .field("instants", &self.read_state().axis.len())
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

/// The model at one query time: two stored instants and their blend.
struct TimeSlice<'a> {
    model: &'a IonModel,
    grids: &'a ModelGrids,
    bracket: TimeBracket,
}

impl LayerFields for TimeSlice<'_> {
    fn observer(&self) -> &ObserverPosition {
        &self.model.config.position
    }

    fn lattice(&self, layer: Layer) -> &LayerLattice {
        self.model.lattice.layer(layer)
    }

    fn sample(&self, layer: Layer, quantity: Quantity, slot: usize, alt_index: usize) -> f64 {
        let grid = self.grids.layer(layer);
        let (lo, hi) = self.bracket.indices();
        self.bracket.blend(
            grid.value(quantity, lo, slot, alt_index),
            grid.value(quantity, hi, slot, alt_index),
        )
    }
}

impl IonModel {
    /// Validate the configuration and lay out the lattice. Nothing is sampled.
    pub fn build(config: ModelConfig) -> Result<PendingModel> {
        config.validate()?;
        let grid = SpatialGrid::new(config.nside)?;
        let axis = TimeAxis::new(config.start, config.end, config.step()?)?;
        let observer = config.position.geo();
        let around = |layer| {
            let spec = *config.layer(layer);
            LayerLattice::around(layer, spec, grid, &observer, config.view_radius(layer))
        };
        let lattice = ModelLattice {
            d: around(Layer::D),
            f: around(Layer::F),
        };
        debug!(
            nside = config.nside,
            times = axis.len(),
            d_pixels = lattice.d.pixels().len(),
            f_pixels = lattice.f.pixels().len(),
            "Model lattice laid out"
        );
        Ok(PendingModel {
            config,
            lattice,
            axis,
        })
    }

    /// Build and compute in one step.
    ///
    /// Refused when `autocalc` is off; such configurations go through
    /// [`IonModel::build`] and an explicit [`PendingModel::compute`].
    pub fn new<S: IonosphereSource + 'static>(config: ModelConfig, source: S) -> Result<Self> {
        if !config.autocalc {
            return Err(IonModelError::configuration(
                "autocalc is disabled; build the model and compute it explicitly",
            ));
        }
        Self::build(config)?.compute(source)
    }

    pub(crate) fn assemble(
        config: ModelConfig,
        lattice: ModelLattice,
        axis: TimeAxis,
        grids: ModelGrids,
        source: Option<Arc<dyn IonosphereSource>>,
    ) -> Self {
        Self {
            config,
            lattice: Arc::new(lattice),
            state: RwLock::new(ModelState { axis, grids }),
            source,
        }
    }

    /// Attach a data source for `recalc` (loaded models have none).
    pub fn with_source<S: IonosphereSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn observer(&self) -> &ObserverPosition {
        &self.config.position
    }

    pub fn lattice(&self, layer: Layer) -> &LayerLattice {
        self.lattice.layer(layer)
    }

    /// Snapshot of the current time axis.
    pub fn time_axis(&self) -> TimeAxis {
        self.read_state().axis.clone()
    }

    /// Stored value at a time index, lattice slot and altitude index.
    pub fn stored_value(
        &self,
        layer: Layer,
        quantity: Quantity,
        time_index: usize,
        slot: usize,
        alt_index: usize,
    ) -> Result<f64> {
        let state = self.read_state();
        let (n_times, n_pixels, n_altitudes) = state.grids.layer(layer).shape();
        if time_index >= n_times || slot >= n_pixels || alt_index >= n_altitudes {
            return Err(IonModelError::out_of_range(format!(
                "index [{}, {}, {}] outside {} grid of shape [{}, {}, {}]",
                time_index, slot, alt_index, layer, n_times, n_pixels, n_altitudes
            )));
        }
        Ok(state.grids.layer(layer).value(quantity, time_index, slot, alt_index))
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the fields interpolated at `dt`.
    fn at_time<T>(
        &self,
        dt: DateTime<Utc>,
        recalc: bool,
        f: impl FnOnce(&TimeSlice<'_>) -> Result<T>,
    ) -> Result<T> {
        if recalc {
            self.ensure_covered(dt)?;
        }
        let state = self.read_state();
        let bracket = state.axis.bracket(dt).ok_or_else(|| {
            IonModelError::out_of_range(format!(
                "{} is outside the modeled instants {} .. {} (use recalc to extend)",
                dt,
                state.axis.first(),
                state.axis.last()
            ))
        })?;
        f(&TimeSlice {
            model: self,
            grids: &state.grids,
            bracket,
        })
    }

    fn source(&self) -> Result<&Arc<dyn IonosphereSource>> {
        self.source.as_ref().ok_or_else(|| {
            IonModelError::configuration(
                "no data source attached; call with_source before recalculating",
            )
        })
    }

    /// Make sure `dt` can be interpolated, sampling the aligned instants
    /// around it when it cannot.
    fn ensure_covered(&self, dt: DateTime<Utc>) -> Result<()> {
        let missing: Vec<DateTime<Utc>> = {
            let state = self.read_state();
            if state.axis.bracket(dt).is_some() {
                return Ok(());
            }
            let (lo, hi) = state.axis.aligned_bracket(dt);
            let mut wanted = vec![lo];
            if hi != lo {
                wanted.push(hi);
            }
            wanted.retain(|t| state.axis.position(*t).is_none());
            wanted
        };

        let source = self.source()?;
        let sampler = ParallelSampler::new(source.as_ref(), self.config.retries)
            .with_label(self.config.pbar_desc.clone());
        let fresh = ModelGrids {
            d: sampler.sample_layer(&self.lattice.d.job(&missing))?,
            f: sampler.sample_layer(&self.lattice.f.job(&missing))?,
        };

        let mut state = self.write_state();
        for (t, instant) in missing.iter().enumerate() {
            if state.axis.position(*instant).is_some() {
                continue;
            }
            let index = state.axis.insert(*instant)?;
            for layer in Layer::ALL {
                state.grids.layer_mut(layer).insert_time(index, fresh.layer(layer), t)?;
            }
        }
        info!(
            query = %dt,
            added = missing.len(),
            instants = state.axis.len(),
            "Time axis extended"
        );
        Ok(())
    }

    /// Interpolated snapshot at `dt`.
    ///
    /// With `recalc`, the source is sampled directly at `dt` instead of
    /// blending stored instants, inside or outside the modeled window.
    pub fn at(&self, dt: DateTime<Utc>, recalc: bool) -> Result<IonFrame> {
        if recalc {
            let source = self.source()?;
            let instants = [dt];
            let sampler = ParallelSampler::new(source.as_ref(), self.config.retries)
                .with_label(self.config.pbar_desc.clone());
            let grids = ModelGrids {
                d: sampler.sample_layer(&self.lattice.d.job(&instants))?,
                f: sampler.sample_layer(&self.lattice.f.job(&instants))?,
            };
            return Ok(IonFrame::from_grids(
                dt,
                self.config.position,
                Arc::clone(&self.lattice),
                &grids,
                TimeBracket::Exact(0),
            ));
        }
        self.at_time(dt, false, |slice| {
            Ok(IonFrame::from_grids(
                dt,
                self.config.position,
                Arc::clone(&self.lattice),
                slice.grids,
                slice.bracket,
            ))
        })
    }

    /// D-layer electron density in m^-3.
    pub fn ded(
        &self,
        target: impl Into<Target>,
        dt: DateTime<Utc>,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.value(Layer::D, Quantity::Density, target, dt, options)
    }

    /// D-layer electron temperature in K.
    pub fn det(
        &self,
        target: impl Into<Target>,
        dt: DateTime<Utc>,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.value(Layer::D, Quantity::Temperature, target, dt, options)
    }

    /// F-layer electron density in m^-3.
    pub fn fed(
        &self,
        target: impl Into<Target>,
        dt: DateTime<Utc>,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.value(Layer::F, Quantity::Density, target, dt, options)
    }

    /// F-layer electron temperature in K.
    pub fn fet(
        &self,
        target: impl Into<Target>,
        dt: DateTime<Utc>,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.value(Layer::F, Quantity::Temperature, target, dt, options)
    }

    /// One sublayer (`options.layer`) or the mean over the layer.
    pub fn value(
        &self,
        layer: Layer,
        quantity: Quantity,
        target: impl Into<Target>,
        dt: DateTime<Utc>,
        options: &QueryOptions,
    ) -> Result<f64> {
        let target = target.into();
        self.at_time(dt, options.recalc, |slice| {
            query::value(slice, layer, quantity, &target, options.layer)
        })
    }

    /// Values over every sublayer altitude, ascending.
    pub fn profile(
        &self,
        layer: Layer,
        quantity: Quantity,
        target: impl Into<Target>,
        dt: DateTime<Utc>,
        options: &QueryOptions,
    ) -> Result<Vec<f64>> {
        let target = target.into();
        self.at_time(dt, options.recalc, |slice| query::profile(slice, layer, quantity, &target))
    }

    /// [`value`](Self::value) at each of `times`.
    pub fn series(
        &self,
        layer: Layer,
        quantity: Quantity,
        target: impl Into<Target>,
        times: &[DateTime<Utc>],
        options: &QueryOptions,
    ) -> Result<Vec<f64>> {
        let target = target.into();
        times
            .iter()
            .map(|&dt| self.value(layer, quantity, target, dt, options))
            .collect()
    }

    /// D-layer attenuation factor in (0, 1] at `freq_mhz`.
    pub fn atten(
        &self,
        dir: SkyDirection,
        dt: DateTime<Utc>,
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.at_time(dt, options.recalc, |slice| {
            query::attenuation(slice, &dir, freq_mhz, options)
        })
    }

    /// Attenuation factor of each D sublayer.
    pub fn atten_profile(
        &self,
        dir: SkyDirection,
        dt: DateTime<Utc>,
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<Vec<f64>> {
        self.at_time(dt, options.recalc, |slice| {
            query::attenuation_profile(slice, &dir, freq_mhz, options)
        })
    }

    pub fn atten_series(
        &self,
        dir: SkyDirection,
        times: &[DateTime<Utc>],
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<Vec<f64>> {
        times
            .iter()
            .map(|&dt| self.atten(dir, dt, freq_mhz, options))
            .collect()
    }

    /// F-layer refraction angle in degrees.
    pub fn refr(
        &self,
        dir: SkyDirection,
        dt: DateTime<Utc>,
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.at_time(dt, options.recalc, |slice| {
            query::refraction(slice, &dir, freq_mhz, options)
        })
    }

    /// Elevation in degrees after refraction.
    pub fn refracted_elevation(
        &self,
        dir: SkyDirection,
        dt: DateTime<Utc>,
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<f64> {
        self.at_time(dt, options.recalc, |slice| {
            query::refracted_elevation(slice, &dir, freq_mhz, options)
        })
    }

    pub fn refr_series(
        &self,
        dir: SkyDirection,
        times: &[DateTime<Utc>],
        freq_mhz: f64,
        options: &QueryOptions,
    ) -> Result<Vec<f64>> {
        times
            .iter()
            .map(|&dt| self.refr(dir, dt, freq_mhz, options))
            .collect()
    }
}
