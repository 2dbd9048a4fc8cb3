//! Analytic Chapman-layer ionosphere.
//!
//! A deterministic stand-in for an empirical model: each layer is an
//! alpha-Chapman profile driven by the solar zenith angle, with a night-time
//! residual so densities never vanish. Electron temperature relaxes from a
//! mesospheric base towards a day/night dependent exospheric value.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::{IonosphereSource, PlasmaSample, SampleCoordinate, SourceError};
use crate::types::Layer;

/// Chapman parameters of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChapmanLayer {
    /// Peak density with the sun overhead, m^-3.
    pub peak_density: f64,
    /// Peak height in km.
    pub peak_height_km: f64,
    /// Scale height in km.
    pub scale_height_km: f64,
    /// Night-time density as a fraction of the overhead-sun profile.
    pub night_fraction: f64,
}

impl ChapmanLayer {
    /// Typical mid-latitude D region.
    pub fn d_region() -> Self {
        Self {
            peak_density: 1.0e9,
            peak_height_km: 85.0,
            scale_height_km: 7.0,
            night_fraction: 0.01,
        }
    }

    /// Typical mid-latitude F2 region.
    pub fn f_region() -> Self {
        Self {
            peak_density: 1.0e12,
            peak_height_km: 300.0,
            scale_height_km: 60.0,
            night_fraction: 0.1,
        }
    }

    /// Density at `alt_km` for a given cosine of the solar zenith angle.
    pub fn density(&self, alt_km: f64, cos_chi: f64) -> f64 {
        let z = (alt_km - self.peak_height_km) / self.scale_height_km;
        let night = self.night_fraction * self.peak_density * (0.5 * (1.0 - z - (-z).exp())).exp();
        if cos_chi <= 1e-3 {
            return night;
        }
        let day = self.peak_density * (0.5 * (1.0 - z - (-z).exp() / cos_chi)).exp();
        day.max(night)
    }
}

/// Chapman ionosphere with optional sub-sample window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapmanSource {
    pub d_layer: ChapmanLayer,
    pub f_layer: ChapmanLayer,
    /// Electron temperature at and below 90 km, K.
    pub base_temperature: f64,
    /// Exospheric electron temperature at night, K.
    pub night_temperature: f64,
    /// Exospheric electron temperature with the sun overhead, K.
    pub day_temperature: f64,
    /// Number of sub-samples spread over `window_minutes` around each instant.
    pub subsamples: usize,
    pub window_minutes: i64,
}

impl Default for ChapmanSource {
    fn default() -> Self {
        Self {
            d_layer: ChapmanLayer::d_region(),
            f_layer: ChapmanLayer::f_region(),
            base_temperature: 190.0,
            night_temperature: 1000.0,
            day_temperature: 2500.0,
            subsamples: 1,
            window_minutes: 0,
        }
    }
}

impl ChapmanSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average `subsamples` evaluations evenly spread over `window_minutes`.
    pub fn with_window(mut self, subsamples: usize, window_minutes: i64) -> Self {
        self.subsamples = subsamples.max(1);
        self.window_minutes = window_minutes.max(0);
        self
    }

    /// Single evaluation at an exact instant.
    pub fn evaluate(
        &self,
        layer: Layer,
        time: DateTime<Utc>,
        lat: f64,
        lon: f64,
        alt_km: f64,
    ) -> PlasmaSample {
        let cos_chi = cos_solar_zenith(time, lat, lon);
        let chapman = match layer {
            Layer::D => &self.d_layer,
            Layer::F => &self.f_layer,
        };
        let density = chapman.density(alt_km, cos_chi);

        let day = cos_chi.max(0.0);
        let t_inf = self.night_temperature + (self.day_temperature - self.night_temperature) * day;
        let rise = 1.0 - (-(alt_km - 90.0).max(0.0) / 60.0).exp();
        let temperature = self.base_temperature + (t_inf - self.base_temperature) * rise;

        PlasmaSample::new(density, temperature)
    }

    fn offsets(&self) -> Vec<Duration> {
        if self.subsamples <= 1 || self.window_minutes == 0 {
            return vec![Duration::zero()];
        }
        let total = Duration::minutes(self.window_minutes);
        let half = total / 2;
        (0..self.subsamples)
            .map(|i| total * i as i32 / (self.subsamples as i32 - 1) - half)
            .collect()
    }
}

impl IonosphereSource for ChapmanSource {
    fn name(&self) -> &str {
        "chapman"
    }

    fn sample(&self, coord: &SampleCoordinate) -> Result<Vec<PlasmaSample>, SourceError> {
        if !coord.alt_km.is_finite() || coord.alt_km < 0.0 {
            return Err(SourceError::Invalid(format!(
                "altitude {} km is below the surface",
                coord.alt_km
            )));
        }
        Ok(self
            .offsets()
            .into_iter()
            .map(|dt| {
                self.evaluate(coord.layer, coord.time + dt, coord.lat, coord.lon, coord.alt_km)
            })
            .collect())
    }
}

/// Cosine of the solar zenith angle (low-precision solar ephemeris).
pub fn cos_solar_zenith(time: DateTime<Utc>, lat: f64, lon: f64) -> f64 {
    let day_of_year = time.ordinal() as f64;
    let season = std::f64::consts::TAU / 365.0 * (day_of_year + 10.0);
    let declination = (-23.44f64).to_radians() * season.cos();
    let utc_hours =
        time.hour() as f64 + time.minute() as f64 / 60.0 + time.second() as f64 / 3600.0;
    let hour_angle = ((utc_hours - 12.0) * 15.0 + lon).to_radians();
    let phi = lat.to_radians();
    phi.sin() * declination.sin() + phi.cos() * declination.cos() * hour_angle.cos()
}
