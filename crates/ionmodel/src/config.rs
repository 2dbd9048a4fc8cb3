//! Construction parameters of a model.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{IonModelError, Result};
use crate::grid::{LayerSpec, SpatialGrid, VerticalProfile};
use crate::time_axis::step_for;
use crate::types::{Layer, ObserverPosition};

/// Everything needed to build an [`IonModel`](crate::IonModel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// First modeled instant.
    pub start: DateTime<Utc>,

    /// End of the modeled window (covered by the last instant).
    pub end: DateTime<Utc>,

    /// Observer location.
    pub position: ObserverPosition,

    /// Time samples per hour.
    pub models_per_hour: u32,

    /// HEALPix resolution parameter (power of two).
    pub nside: u32,

    /// Sublayering of both layers, stored as `d_layer` and `f_layer`.
    #[serde(flatten)]
    pub profile: VerticalProfile,

    /// Radius of the sampled disc around the observer for the D layer,
    /// in degrees. `None` samples the whole sphere.
    pub d_view_radius_deg: Option<f64>,

    /// Same for the F layer.
    pub f_view_radius_deg: Option<f64>,

    /// Extra attempts per coordinate when the data source fails.
    pub retries: u32,

    /// Allow [`IonModel::new`](crate::IonModel::new) to sample right away.
    /// When off, only the lattice is laid out until an explicit compute.
    pub autocalc: bool,

    /// Label used in progress reports.
    pub pbar_desc: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let now = Utc::now();
        let start = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
        Self::new(start, start + Duration::hours(24), ObserverPosition::default())
    }
}

impl ModelConfig {
    /// Default parameters for the given window and observer.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, position: ObserverPosition) -> Self {
        Self {
            start,
            end,
            position,
            models_per_hour: 1,
            nside: 128,
            profile: VerticalProfile::default(),
            d_view_radius_deg: Some(12.0),
            f_view_radius_deg: Some(24.0),
            retries: 3,
            autocalc: true,
            pbar_desc: None,
        }
    }

    /// Set the HEALPix resolution.
    pub fn with_nside(mut self, nside: u32) -> Self {
        self.nside = nside;
        self
    }

    /// Set both layer specs.
    pub fn with_layers(mut self, d_layer: LayerSpec, f_layer: LayerSpec) -> Self {
        self.profile = VerticalProfile { d_layer, f_layer };
        self
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `IONMODEL_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env(&mut self) {
        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            let val = std::env::var(key).ok()?;
            match val.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key = %key, value = %val, "Ignoring unparseable environment value");
                    None
                }
            }
        }

        if let Some(start) = parsed::<DateTime<Utc>>("IONMODEL_START") {
            self.start = start;
        }
        if let Some(end) = parsed::<DateTime<Utc>>("IONMODEL_END") {
            self.end = end;
        }
        if let Some(lat) = parsed("IONMODEL_LAT") {
            self.position.lat = lat;
        }
        if let Some(lon) = parsed("IONMODEL_LON") {
            self.position.lon = lon;
        }
        if let Some(elevation) = parsed("IONMODEL_ELEVATION_M") {
            self.position.elevation_m = elevation;
        }
        if let Some(mph) = parsed("IONMODEL_MODELS_PER_HOUR") {
            self.models_per_hour = mph;
        }
        if let Some(nside) = parsed("IONMODEL_NSIDE") {
            self.nside = nside;
        }
        if let Some(retries) = parsed("IONMODEL_RETRIES") {
            self.retries = retries;
        }
        if let Ok(val) = std::env::var("IONMODEL_AUTOCALC") {
            self.autocalc = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("IONMODEL_PBAR_DESC") {
            self.pbar_desc = Some(val).filter(|s| !s.is_empty());
        }
    }

    /// Check every parameter; nothing is sampled before this passes.
    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(IonModelError::configuration(format!(
                "time window end {} must be after start {}",
                self.end, self.start
            )));
        }
        self.position.validate()?;
        step_for(self.models_per_hour)?;
        SpatialGrid::new(self.nside)?;
        self.profile.validate()?;
        for layer in Layer::ALL {
            if let Some(r) = self.view_radius(layer) {
                if !r.is_finite() {
                    return Err(IonModelError::configuration(format!(
                        "{} view radius must be finite",
                        layer
                    )));
                }
            }
        }
        Ok(())
    }

    /// Time step between samples.
    pub fn step(&self) -> Result<Duration> {
        step_for(self.models_per_hour)
    }

    pub fn layer(&self, layer: Layer) -> &LayerSpec {
        self.profile.layer(layer)
    }

    pub fn view_radius(&self, layer: Layer) -> Option<f64> {
        match layer {
            Layer::D => self.d_view_radius_deg,
            Layer::F => self.f_view_radius_deg,
        }
    }
}
