//! On-disk model format.
//!
//! A saved model is a directory holding `model.json` (configuration, time
//! axis, sampled pixels and array shapes) and one raw array file per
//! quantity: `ded.bin`, `det.bin`, `fed.bin`, `fet.bin`. Arrays are
//! little-endian f64, row-major `[time, pixel, altitude]`.
//!
//! Nothing in the manifest is trusted on load: the time axis is rebuilt
//! and checked against the configuration, and every array is checked
//! against the axis and pixel counts before a model is returned.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ModelConfig;
use crate::error::{IonModelError, Result};
use crate::grid::SpatialGrid;
use crate::model::{IonModel, LayerGrid, LayerLattice, ModelGrids, ModelLattice};
use crate::time_axis::TimeAxis;
use crate::types::{Layer, Quantity};

/// Current manifest version.
pub const FORMAT_VERSION: u32 = 1;
/// Element type tag of the array files (numpy notation).
pub const DTYPE: &str = "<f8";
/// Manifest file name.
pub const MANIFEST_FILE: &str = "model.json";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    dtype: String,
    config: ModelConfig,
    time_axis: StoredAxis,
    d_pixels: Vec<u64>,
    f_pixels: Vec<u64>,
    shapes: BTreeMap<String, [usize; 3]>,
}

/// Time axis as written to the manifest.
#[derive(Debug, Serialize, Deserialize)]
struct StoredAxis {
    origin: DateTime<Utc>,
    step_seconds: i64,
    instants: Vec<DateTime<Utc>>,
}

impl StoredAxis {
    fn from_axis(axis: &TimeAxis) -> Self {
        Self {
            origin: axis.origin(),
            step_seconds: axis.step().num_seconds(),
            instants: axis.instants().to_vec(),
        }
    }

    /// Rebuild the axis, requiring it to match the stored configuration.
    fn into_axis(self, config: &ModelConfig) -> Result<TimeAxis> {
        let step = config.step()?;
        if self.origin != config.start {
            return Err(IonModelError::persistence(format!(
                "time axis origin {} does not match configured start {}",
                self.origin, config.start
            )));
        }
        if self.step_seconds != step.num_seconds() {
            return Err(IonModelError::persistence(format!(
                "time axis step {} s does not match the configured {} s",
                self.step_seconds,
                step.num_seconds()
            )));
        }
        let stored_step = Duration::seconds(self.step_seconds);
        let axis = TimeAxis::from_instants(self.origin, stored_step, self.instants)?;
        let window = TimeAxis::new(config.start, config.end, step)?;
        if let Some(missing) = window.instants().iter().find(|t| axis.position(**t).is_none()) {
            return Err(IonModelError::persistence(format!(
                "time axis lacks the configured instant {}",
                missing
            )));
        }
        Ok(axis)
    }
}

/// Array file stem, e.g. `ded` for D-layer density.
pub fn array_name(layer: Layer, quantity: Quantity) -> String {
    let q = match quantity {
        Quantity::Density => "ed",
        Quantity::Temperature => "et",
    };
    format!("{}{}", layer.as_str(), q)
}

const ARRAYS: [(Layer, Quantity); 4] = [
    (Layer::D, Quantity::Density),
    (Layer::D, Quantity::Temperature),
    (Layer::F, Quantity::Density),
    (Layer::F, Quantity::Temperature),
];

fn encode(values: &[f64]) -> Vec<u8> {
    let words: Vec<u64> = values.iter().map(|v| v.to_bits().to_le()).collect();
    bytemuck::cast_slice(&words).to_vec()
}

fn decode(bytes: &[u8]) -> Vec<f64> {
    bytemuck::pod_collect_to_vec::<u8, u64>(bytes)
        .into_iter()
        .map(|w| f64::from_bits(u64::from_le(w)))
        .collect()
}

impl IonModel {
    /// Directory name used when `save` gets no explicit name.
    pub fn default_name(&self) -> String {
        format!(
            "ionmodel_{}_{}",
            self.config().start.format("%Y%m%d%H%M"),
            self.config().end.format("%Y%m%d%H%M")
        )
    }

    /// Write the model to `dir/name` and return that path.
    pub fn save(&self, dir: impl AsRef<Path>, name: Option<&str>) -> Result<PathBuf> {
        let name = name.map(str::to_string).unwrap_or_else(|| self.default_name());
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
            return Err(IonModelError::persistence(format!("invalid model name {:?}", name)));
        }
        let path = dir.as_ref().join(&name);
        fs::create_dir_all(&path)?;

        let state = self.read_state();
        let mut shapes = BTreeMap::new();
        for (layer, quantity) in ARRAYS {
            let grid = state.grids.layer(layer);
            let (t, p, a) = grid.shape();
            shapes.insert(array_name(layer, quantity), [t, p, a]);
            fs::write(
                path.join(format!("{}.bin", array_name(layer, quantity))),
                encode(grid.values(quantity)),
            )?;
        }

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            dtype: DTYPE.to_string(),
            config: self.config().clone(),
            time_axis: StoredAxis::from_axis(&state.axis),
            d_pixels: self.lattice(Layer::D).pixels().to_vec(),
            f_pixels: self.lattice(Layer::F).pixels().to_vec(),
            shapes,
        };
        fs::write(path.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;

        info!(path = %path.display(), instants = state.axis.len(), "Model saved");
        Ok(path)
    }

    /// Read a model written by [`save`](Self::save).
    ///
    /// Every file is validated before anything is returned. The loaded
    /// model has no data source; attach one with `with_source` for `recalc`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let manifest_path = path.join(MANIFEST_FILE);
        let raw = fs::read(&manifest_path).map_err(|e| {
            IonModelError::persistence(format!("cannot read {}: {}", manifest_path.display(), e))
        })?;
        let manifest: Manifest = serde_json::from_slice(&raw)?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(IonModelError::persistence(format!(
                "unsupported format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }
        if manifest.dtype != DTYPE {
            return Err(IonModelError::persistence(format!(
                "unsupported dtype {:?} (expected {:?})",
                manifest.dtype, DTYPE
            )));
        }
        let config = manifest.config;
        config.validate().map_err(|e| {
            IonModelError::persistence(format!("stored configuration is invalid: {}", e))
        })?;
        let axis = manifest.time_axis.into_axis(&config)?;
        let grid = SpatialGrid::new(config.nside)?;
        let stored = |layer, pixels| {
            LayerLattice::from_pixels(layer, *config.layer(layer), grid, pixels)
        };
        let lattice = ModelLattice {
            d: stored(Layer::D, manifest.d_pixels)?,
            f: stored(Layer::F, manifest.f_pixels)?,
        };

        let mut arrays = BTreeMap::new();
        for (layer, quantity) in ARRAYS {
            let name = array_name(layer, quantity);
            let l = lattice.layer(layer);
            let expected = [axis.len(), l.pixels().len(), l.altitudes().len()];
            match manifest.shapes.get(&name) {
                Some(shape) if *shape == expected => {}
                Some(shape) => {
                    return Err(IonModelError::persistence(format!(
                        "{} has shape {:?}, expected {:?}",
                        name, shape, expected
                    )))
                }
                None => {
                    return Err(IonModelError::persistence(format!(
                        "manifest has no shape for {}",
                        name
                    )))
                }
            }

            let file = path.join(format!("{}.bin", name));
            let bytes = fs::read(&file).map_err(|e| {
                IonModelError::persistence(format!("cannot read {}: {}", file.display(), e))
            })?;
            let len = expected.iter().product::<usize>();
            if bytes.len() != len * std::mem::size_of::<f64>() {
                return Err(IonModelError::persistence(format!(
                    "{} holds {} bytes, expected {}",
                    file.display(),
                    bytes.len(),
                    len * std::mem::size_of::<f64>()
                )));
            }
            arrays.insert(name, decode(&bytes));
        }

        let mut take = |layer: Layer, quantity: Quantity| {
            arrays.remove(&array_name(layer, quantity)).unwrap_or_default()
        };
        let mut layer_grid = |layer: Layer| -> Result<LayerGrid> {
            let l = lattice.layer(layer);
            let grid = LayerGrid::new(
                axis.len(),
                l.pixels().len(),
                l.altitudes().len(),
                take(layer, Quantity::Density),
                take(layer, Quantity::Temperature),
            )
            .map_err(|e| IonModelError::persistence(e.to_string()))?;
            if let Some((t, p, a)) = grid.first_invalid() {
                return Err(IonModelError::persistence(format!(
                    "{} holds a non-physical value at [{}, {}, {}]",
                    layer, t, p, a
                )));
            }
            Ok(grid)
        };
        let grids = ModelGrids {
            d: layer_grid(Layer::D)?,
            f: layer_grid(Layer::F)?,
        };

        info!(path = %path.display(), instants = axis.len(), "Model loaded");
        Ok(IonModel::assemble(config, lattice, axis, grids, None))
    }
}
