//! Common helpers for ionmodel integration tests
//!
//! Provides:
//! - Small model configurations that compute in milliseconds
//! - Data sources that count, fail or misbehave on purpose

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use ionmodel::{
    ChapmanSource, IonModel, IonosphereSource, LayerSpec, ModelConfig, ObserverPosition,
    PlasmaSample, SampleCoordinate, SourceError,
};
use test_utils::{layers, observers, time};

pub fn observer() -> ObserverPosition {
    let (lat, lon, elevation) = observers::OTTAWA;
    ObserverPosition::new(lat, lon, elevation)
}

/// Coarse lattice over the three-hour reference window.
pub fn coarse_config() -> ModelConfig {
    let (start, end) = time::three_hour_window();
    let (db, dt, dn) = layers::D_COARSE;
    let (fb, ft, fnum) = layers::F_COARSE;
    ModelConfig::new(start, end, observer())
        .with_nside(8)
        .with_layers(
            LayerSpec::new(db, dt, dn).unwrap(),
            LayerSpec::new(fb, ft, fnum).unwrap(),
        )
}

pub fn coarse_model() -> IonModel {
    IonModel::new(coarse_config(), ChapmanSource::default()).unwrap()
}

/// Counts every call and forwards to the Chapman source.
#[derive(Default)]
pub struct CountingSource {
    pub calls: AtomicUsize,
    inner: ChapmanSource,
}

impl CountingSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IonosphereSource for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    fn sample(&self, coord: &SampleCoordinate) -> Result<Vec<PlasmaSample>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sample(coord)
    }
}

/// Always unavailable.
pub struct DeadSource;

impl IonosphereSource for DeadSource {
    fn sample(&self, _coord: &SampleCoordinate) -> Result<Vec<PlasmaSample>, SourceError> {
        Err(SourceError::Unavailable("connection refused".into()))
    }
}

/// Returns negative densities above 400 km.
pub struct NegativeSource;

impl IonosphereSource for NegativeSource {
    fn sample(&self, coord: &SampleCoordinate) -> Result<Vec<PlasmaSample>, SourceError> {
        let density = if coord.alt_km > 400.0 { -1.0 } else { 1.0e10 };
        Ok(vec![PlasmaSample::new(density, 800.0)])
    }
}
