//! Precomputed spatio-temporal ionosphere model.
//!
//! An [`IonModel`] samples an [`IonosphereSource`] on a HEALPix lattice
//! around an observer, for the D and F layers at a set of sublayer altitudes
//! and at regular instants over a time window. Point queries blend the four
//! pixels around the query point and interpolate linearly between the two
//! stored instants around the query time. The physics kernel turns the
//! result into radio attenuation and refraction.
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use ionmodel::{
//!     ChapmanSource, IonModel, ModelConfig, ObserverPosition, QueryOptions, SkyDirection,
//! };
//!
//! let start = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
//! let observer = ObserverPosition::new(45.0, -75.0, 100.0);
//! let config = ModelConfig::new(start, start + chrono::Duration::hours(3), observer);
//! let model = IonModel::new(config, ChapmanSource::default())?;
//! let atten = model.atten(SkyDirection::zenith(), start, 10.0, &QueryOptions::default())?;
//! # Ok::<(), ionmodel::IonModelError>(())
//! ```

pub mod animation;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod model;
pub mod persistence;
pub mod physics;
pub mod sampler;
pub mod source;
pub mod time_axis;
pub mod types;

pub use animation::{AnimationOptions, FrameRenderer, PlotStyle, SkyFrame};
pub use config::ModelConfig;
pub use error::{IonModelError, Result};
pub use grid::{LayerSpec, SpatialGrid, VerticalProfile};
pub use model::{
    IonFrame, IonModel, LayerGrid, LayerLattice, ModelGrids, PendingModel, QueryOptions,
};
pub use physics::CollisionModel;
pub use sampler::{NoProgress, ParallelSampler, Progress, SamplingJob, TracingProgress};
pub use source::{ChapmanSource, IonosphereSource, PlasmaSample, SampleCoordinate, SourceError};
pub use time_axis::{TimeAxis, TimeBracket};
pub use types::{GeoPoint, Layer, ObserverPosition, Quantity, SkyDirection, Target};
