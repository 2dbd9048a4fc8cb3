//! External ionospheric data source interface.
//!
//! The model never talks to a concrete ionosphere model directly. It asks an
//! [`IonosphereSource`] for electron density and temperature at one
//! coordinate at a time; the source may return several sub-samples for one
//! coordinate (e.g. a short averaging window) which the sampler averages.

mod chapman;

pub use chapman::{ChapmanLayer, ChapmanSource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Layer;

/// One lattice coordinate handed to the data source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleCoordinate {
    pub layer: Layer,
    pub time: DateTime<Utc>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Altitude in km.
    pub alt_km: f64,
}

impl std::fmt::Display for SampleCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} lat={:.4} lon={:.4} alt={:.2} km",
            self.layer,
            self.time.to_rfc3339(),
            self.lat,
            self.lon,
            self.alt_km
        )
    }
}

/// Electron density (m^-3) and electron temperature (K).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlasmaSample {
    pub density: f64,
    pub temperature: f64,
}

impl PlasmaSample {
    pub fn new(density: f64, temperature: f64) -> Self {
        Self {
            density,
            temperature,
        }
    }

    /// Finite, non-negative density and positive temperature.
    pub fn is_valid(&self) -> bool {
        self.density.is_finite()
            && self.temperature.is_finite()
            && self.density >= 0.0
            && self.temperature > 0.0
    }

    /// Arithmetic mean of sub-samples; `None` for an empty slice.
    pub fn mean(samples: &[PlasmaSample]) -> Option<PlasmaSample> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let (density, temperature) = samples
            .iter()
            .fold((0.0, 0.0), |(d, t), s| (d + s.density, t + s.temperature));
        Some(PlasmaSample::new(density / n, temperature / n))
    }
}

/// Failure reported by a data source for one coordinate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The source could not answer (I/O, remote service, ...). Retried.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with unusable data. Retried.
    #[error("invalid sample: {0}")]
    Invalid(String),
}

/// Provider of raw ionospheric samples.
///
/// Implementations must be thread-safe: the sampler calls `sample`
/// concurrently from a worker pool.
pub trait IonosphereSource: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str {
        "unnamed source"
    }

    /// Sub-samples at one coordinate. The sampler stores their mean.
    fn sample(&self, coord: &SampleCoordinate) -> Result<Vec<PlasmaSample>, SourceError>;
}

impl<T: IonosphereSource + ?Sized> IonosphereSource for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sample(&self, coord: &SampleCoordinate) -> Result<Vec<PlasmaSample>, SourceError> {
        (**self).sample(coord)
    }
}
