//! Point queries shared by the interpolating model and frozen frames.
//!
//! Both answer the same questions from different storage: [`IonModel`]
//! blends two stored instants, an [`IonFrame`] holds one snapshot. They
//! expose it through [`LayerFields`] and every accessor is written once here.
//! Between pixel centers a value is blended from the four surrounding
//! pixels of its sublayer.
//!
//! [`IonModel`]: super::IonModel
//! [`IonFrame`]: super::IonFrame

use crate::error::{IonModelError, Result};
use crate::geometry::{sky_to_ground, EARTH_RADIUS_KM};
use crate::physics::{
    apply_troposphere, d_layer_attenuation, mhz_to_hz, plasma_frequency, refractive_index,
    stratified_bending, CollisionModel,
};
use crate::types::{Layer, ObserverPosition, Quantity, SkyDirection, Target};

use super::lattice::LayerLattice;

/// Per-call query options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// Single sublayer index; `None` averages over the layer.
    pub layer: Option<usize>,
    /// Extend the time axis on demand for out-of-window times.
    pub recalc: bool,
    /// Apply the tropospheric bending correction first.
    pub troposphere: bool,
    /// Collision frequency model for attenuation.
    pub col_freq: CollisionModel,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            layer: None,
            recalc: false,
            troposphere: true,
            col_freq: CollisionModel::Default,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, index: usize) -> Self {
        self.layer = Some(index);
        self
    }

    pub fn recalc(mut self, recalc: bool) -> Self {
        self.recalc = recalc;
        self
    }

    pub fn troposphere(mut self, enabled: bool) -> Self {
        self.troposphere = enabled;
        self
    }

    pub fn col_freq(mut self, model: CollisionModel) -> Self {
        self.col_freq = model;
        self
    }
}

/// Stored fields at one (possibly interpolated) instant.
pub(crate) trait LayerFields {
    fn observer(&self) -> &ObserverPosition;

    fn lattice(&self, layer: Layer) -> &LayerLattice;

    /// Value at a lattice slot and altitude index.
    fn sample(&self, layer: Layer, quantity: Quantity, slot: usize, alt_index: usize) -> f64;

    /// Weighted sum of slot values at one altitude index.
    fn blend(
        &self,
        layer: Layer,
        quantity: Quantity,
        weights: &[(usize, f64)],
        alt_index: usize,
    ) -> f64 {
        weights
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|&(slot, w)| w * self.sample(layer, quantity, slot, alt_index))
            .sum()
    }
}

/// Interpolated value where the target meets the sublayer at `alt_index`.
fn sample_at<F: LayerFields + ?Sized>(
    fields: &F,
    layer: Layer,
    quantity: Quantity,
    target: &Target,
    alt_index: usize,
    alt_km: f64,
) -> Result<f64> {
    let lattice = fields.lattice(layer);
    let weights = match target {
        Target::Sky(dir) => lattice.interpolation(&sky_to_ground(fields.observer(), dir, alt_km))?,
        Target::Geo(point) => lattice.interpolation(point)?,
    };
    Ok(fields.blend(layer, quantity, &weights, alt_index))
}

fn check_target(target: &Target) -> Result<()> {
    match target {
        Target::Sky(dir) => dir.validate(),
        Target::Geo(p) if p.lat.is_finite() && p.lon.is_finite() && p.lat.abs() <= 90.0 => Ok(()),
        Target::Geo(p) => Err(IonModelError::out_of_range(format!(
            "geographic point ({}, {}) is not on the sphere",
            p.lat, p.lon
        ))),
    }
}

/// Values over all sublayer altitudes, ascending.
pub(crate) fn profile<F: LayerFields + ?Sized>(
    fields: &F,
    layer: Layer,
    quantity: Quantity,
    target: &Target,
) -> Result<Vec<f64>> {
    check_target(target)?;
    fields
        .lattice(layer)
        .altitudes()
        .iter()
        .enumerate()
        .map(|(a, &alt)| sample_at(fields, layer, quantity, target, a, alt))
        .collect()
}

/// One sublayer, or the mean over sublayers.
pub(crate) fn value<F: LayerFields + ?Sized>(
    fields: &F,
    layer: Layer,
    quantity: Quantity,
    target: &Target,
    sublayer: Option<usize>,
) -> Result<f64> {
    match sublayer {
        Some(a) => {
            check_target(target)?;
            let altitudes = fields.lattice(layer).altitudes();
            let alt = *altitudes.get(a).ok_or_else(|| {
                IonModelError::out_of_range(format!(
                    "sublayer {} requested but the {} has {}",
                    a,
                    layer,
                    altitudes.len()
                ))
            })?;
            sample_at(fields, layer, quantity, target, a, alt)
        }
        None => {
            let values = profile(fields, layer, quantity, target)?;
            Ok(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

fn check_frequency(freq_mhz: f64) -> Result<f64> {
    if freq_mhz.is_finite() && freq_mhz > 0.0 {
        Ok(mhz_to_hz(freq_mhz))
    } else {
        Err(IonModelError::out_of_range(format!(
            "frequency must be positive, got {} MHz",
            freq_mhz
        )))
    }
}

/// Elevation after the optional tropospheric correction.
fn apparent<F: LayerFields + ?Sized>(
    fields: &F,
    dir: &SkyDirection,
    troposphere: bool,
) -> Result<SkyDirection> {
    dir.validate()?;
    if troposphere {
        Ok(SkyDirection::new(
            apply_troposphere(dir.el, fields.observer().elevation_km()),
            dir.az,
        ))
    } else {
        Ok(*dir)
    }
}

/// Attenuation factor of each D sublayer.
pub(crate) fn attenuation_profile<F: LayerFields + ?Sized>(
    fields: &F,
    dir: &SkyDirection,
    freq_mhz: f64,
    options: &QueryOptions,
) -> Result<Vec<f64>> {
    let freq_hz = check_frequency(freq_mhz)?;
    let dir = apparent(fields, dir, options.troposphere)?;
    let spec = *fields.lattice(Layer::D).spec();
    let (mid_m, thickness_m) = (spec.mid_height_km() * 1.0e3, spec.thickness_km() * 1.0e3);
    let zenith = dir.zenith_angle();

    let densities = profile(fields, Layer::D, Quantity::Density, &Target::Sky(dir))?;
    Ok(fields
        .lattice(Layer::D)
        .altitudes()
        .iter()
        .zip(densities)
        .map(|(&alt, density)| {
            d_layer_attenuation(
                freq_hz,
                zenith,
                mid_m,
                thickness_m,
                plasma_frequency(density),
                options.col_freq.frequency(alt),
            )
        })
        .collect())
}

/// Mean D-layer attenuation factor, or the factor of one sublayer.
pub(crate) fn attenuation<F: LayerFields + ?Sized>(
    fields: &F,
    dir: &SkyDirection,
    freq_mhz: f64,
    options: &QueryOptions,
) -> Result<f64> {
    let factors = attenuation_profile(fields, dir, freq_mhz, options)?;
    match options.layer {
        Some(a) => factors.get(a).copied().ok_or_else(|| {
            IonModelError::out_of_range(format!(
                "sublayer {} requested but the D layer has {}",
                a,
                factors.len()
            ))
        }),
        None => Ok(factors.iter().sum::<f64>() / factors.len() as f64),
    }
}

/// F-layer bending in degrees and the apparent elevation it applies to.
fn bending<F: LayerFields + ?Sized>(
    fields: &F,
    dir: &SkyDirection,
    freq_mhz: f64,
    options: &QueryOptions,
) -> Result<(f64, SkyDirection)> {
    let freq_hz = check_frequency(freq_mhz)?;
    let dir = apparent(fields, dir, options.troposphere)?;
    let lattice = fields.lattice(Layer::F);
    let altitudes = lattice.altitudes();

    let indices: Vec<f64> = profile(fields, Layer::F, Quantity::Density, &Target::Sky(dir))?
        .into_iter()
        .map(|density| refractive_index(density, freq_hz))
        .collect();
    let mut boundaries: Vec<f64> = altitudes.iter().map(|h| EARTH_RADIUS_KM + h).collect();
    let top = altitudes[altitudes.len() - 1] + lattice.spec().spacing_km();
    boundaries.push(EARTH_RADIUS_KM + top);

    let observer_radius = EARTH_RADIUS_KM + fields.observer().elevation_km();
    let bend = stratified_bending(dir.zenith_angle(), observer_radius, &boundaries, &indices);
    Ok((bend.to_degrees(), dir))
}

/// Total F-layer refraction angle in degrees.
pub(crate) fn refraction<F: LayerFields + ?Sized>(
    fields: &F,
    dir: &SkyDirection,
    freq_mhz: f64,
    options: &QueryOptions,
) -> Result<f64> {
    bending(fields, dir, freq_mhz, options).map(|(deg, _)| deg)
}

/// Elevation after tropospheric (optional) and ionospheric refraction.
pub(crate) fn refracted_elevation<F: LayerFields + ?Sized>(
    fields: &F,
    dir: &SkyDirection,
    freq_mhz: f64,
    options: &QueryOptions,
) -> Result<f64> {
    bending(fields, dir, freq_mhz, options).map(|(deg, apparent)| apparent.el - deg)
}
