//! Vertical sublayering of the D and F layers.

use serde::{Deserialize, Serialize};

use crate::error::{IonModelError, Result};
use crate::types::Layer;

/// Altitude range of one layer divided into equal sublayers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Lower limit in km.
    pub bottom_km: f64,
    /// Upper limit in km.
    pub top_km: f64,
    /// Number of sampled sublayers.
    pub n_sublayers: usize,
}

impl LayerSpec {
    /// Create and validate a layer specification.
    pub fn new(bottom_km: f64, top_km: f64, n_sublayers: usize) -> Result<Self> {
        let spec = Self {
            bottom_km,
            top_km,
            n_sublayers,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Default D layer: 60-90 km in 10 sublayers.
    pub fn d_layer() -> Self {
        Self {
            bottom_km: 60.0,
            top_km: 90.0,
            n_sublayers: 10,
        }
    }

    /// Default F layer: 150-500 km in 30 sublayers.
    pub fn f_layer() -> Self {
        Self {
            bottom_km: 150.0,
            top_km: 500.0,
            n_sublayers: 30,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bottom_km.is_finite() || !self.top_km.is_finite() {
            return Err(IonModelError::configuration("layer limits must be finite"));
        }
        if self.bottom_km < 0.0 {
            return Err(IonModelError::configuration(format!(
                "layer bottom {} km is below the surface",
                self.bottom_km
            )));
        }
        if self.bottom_km >= self.top_km {
            return Err(IonModelError::configuration(format!(
                "layer bottom {} km must be below top {} km",
                self.bottom_km, self.top_km
            )));
        }
        if self.n_sublayers < 1 {
            return Err(IonModelError::configuration(
                "a layer needs at least one sublayer",
            ));
        }
        Ok(())
    }

    /// Sample altitudes in km, ascending, including both limits.
    ///
    /// A single sublayer is sampled at the layer midpoint.
    pub fn altitudes(&self) -> Vec<f64> {
        if self.n_sublayers == 1 {
            return vec![self.mid_height_km()];
        }
        let step = self.spacing_km();
        (0..self.n_sublayers)
            .map(|i| {
                if i + 1 == self.n_sublayers {
                    self.top_km
                } else {
                    self.bottom_km + i as f64 * step
                }
            })
            .collect()
    }

    /// Distance between consecutive samples (the full thickness for one sublayer).
    pub fn spacing_km(&self) -> f64 {
        if self.n_sublayers > 1 {
            self.thickness_km() / (self.n_sublayers - 1) as f64
        } else {
            self.thickness_km()
        }
    }

    pub fn thickness_km(&self) -> f64 {
        self.top_km - self.bottom_km
    }

    pub fn mid_height_km(&self) -> f64 {
        self.bottom_km + self.thickness_km() / 2.0
    }
}

/// D and F layer sublayering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalProfile {
    pub d_layer: LayerSpec,
    pub f_layer: LayerSpec,
}

impl VerticalProfile {
    /// Validate both layers. Overlap is allowed.
    pub fn new(d_layer: LayerSpec, f_layer: LayerSpec) -> Result<Self> {
        let profile = Self { d_layer, f_layer };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        self.d_layer.validate()?;
        self.f_layer.validate()
    }

    pub fn layer(&self, layer: Layer) -> &LayerSpec {
        match layer {
            Layer::D => &self.d_layer,
            Layer::F => &self.f_layer,
        }
    }
}

impl Default for VerticalProfile {
    fn default() -> Self {
        Self {
            d_layer: LayerSpec::d_layer(),
            f_layer: LayerSpec::f_layer(),
        }
    }
}
