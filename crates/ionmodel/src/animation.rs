//! Frame gathering for an external animation renderer.
//!
//! The model renders nothing itself. `animate_*_vs_time` evaluates one
//! quantity on an elevation/azimuth mesh at evenly spaced instants and hands
//! the frames, with styling options forwarded untouched, to a
//! [`FrameRenderer`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{IonModelError, Result};
use crate::geometry::elaz_mesh;
use crate::model::{IonFrame, IonModel, QueryOptions};
use crate::types::{Layer, Quantity, SkyDirection};

/// Lowest elevation evaluated on a mesh; the horizon row is moved here.
pub const MIN_MESH_ELEVATION_DEG: f64 = 1.0;

/// Styling options for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    /// Colormap name.
    pub cmap: String,
    /// Free-form options passed through to the renderer.
    pub options: BTreeMap<String, String>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            cmap: "viridis".to_string(),
            options: BTreeMap::new(),
        }
    }
}

impl PlotStyle {
    pub fn with_cmap(mut self, cmap: impl Into<String>) -> Self {
        self.cmap = cmap.into();
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// One frame of sky values, azimuth-major over a `gridsize²` mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyFrame {
    pub time: DateTime<Utc>,
    pub gridsize: usize,
    /// Mesh elevations in degrees, as plotted (the horizon row is 0).
    pub el: Vec<f64>,
    /// Mesh azimuths in degrees.
    pub az: Vec<f64>,
    pub values: Vec<f64>,
}

/// Receiver of gathered frames, e.g. a plotting or video backend.
pub trait FrameRenderer {
    fn render(
        &mut self,
        title: &str,
        frames: &[SkyFrame],
        style: &PlotStyle,
    ) -> std::result::Result<(), String>;
}

/// Frame count, mesh density, styling and query options.
#[derive(Debug, Clone)]
pub struct AnimationOptions {
    pub nframes: usize,
    pub gridsize: usize,
    pub style: PlotStyle,
    pub query: QueryOptions,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            nframes: 24,
            gridsize: 48,
            style: PlotStyle::default(),
            query: QueryOptions::default(),
        }
    }
}

impl IonModel {
    /// Evenly spaced instants over the configured window.
    fn frame_times(&self, nframes: usize) -> Vec<DateTime<Utc>> {
        let (start, end) = (self.config().start, self.config().end);
        match nframes {
            0 => Vec::new(),
            1 => vec![start],
            n => (0..n)
                .map(|i| start + (end - start) * i as i32 / (n as i32 - 1))
                .collect(),
        }
    }

    fn animate_with<R, F>(
        &self,
        title: &str,
        renderer: &mut R,
        options: &AnimationOptions,
        eval: F,
    ) -> Result<()>
    where
        R: FrameRenderer + ?Sized,
        F: Fn(&IonFrame, SkyDirection) -> Result<f64>,
    {
        if options.nframes == 0 || options.gridsize == 0 {
            return Err(IonModelError::configuration(
                "animation needs at least one frame and one mesh point",
            ));
        }
        let (el, az) = elaz_mesh(options.gridsize);
        let frames = self
            .frame_times(options.nframes)
            .into_iter()
            .map(|time| {
                let frame = self.at(time, false)?;
                let values = el
                    .iter()
                    .zip(&az)
                    .map(|(&e, &a)| {
                        eval(&frame, SkyDirection::new(e.max(MIN_MESH_ELEVATION_DEG), a))
                    })
                    .collect::<Result<Vec<f64>>>()?;
                Ok(SkyFrame {
                    time,
                    gridsize: options.gridsize,
                    el: el.clone(),
                    az: az.clone(),
                    values,
                })
            })
            .collect::<Result<Vec<SkyFrame>>>()?;

        info!(
            title = %title,
            frames = frames.len(),
            gridsize = options.gridsize,
            "Handing frames to renderer"
        );
        renderer
            .render(title, &frames, &options.style)
            .map_err(IonModelError::render)
    }

    fn animate_quantity<R: FrameRenderer + ?Sized>(
        &self,
        layer: Layer,
        quantity: Quantity,
        renderer: &mut R,
        options: &AnimationOptions,
    ) -> Result<()> {
        let title = format!("{} {}", layer, quantity);
        self.animate_with(&title, renderer, options, |frame, dir| {
            frame.value(layer, quantity, dir, &options.query)
        })
    }

    /// D-layer electron density over time.
    pub fn animate_ded_vs_time<R: FrameRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        options: &AnimationOptions,
    ) -> Result<()> {
        self.animate_quantity(Layer::D, Quantity::Density, renderer, options)
    }

    /// D-layer electron temperature over time.
    pub fn animate_det_vs_time<R: FrameRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        options: &AnimationOptions,
    ) -> Result<()> {
        self.animate_quantity(Layer::D, Quantity::Temperature, renderer, options)
    }

    /// F-layer electron density over time.
    pub fn animate_fed_vs_time<R: FrameRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        options: &AnimationOptions,
    ) -> Result<()> {
        self.animate_quantity(Layer::F, Quantity::Density, renderer, options)
    }

    /// F-layer electron temperature over time.
    pub fn animate_fet_vs_time<R: FrameRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        options: &AnimationOptions,
    ) -> Result<()> {
        self.animate_quantity(Layer::F, Quantity::Temperature, renderer, options)
    }

    /// D-layer attenuation factor at `freq_mhz` over time.
    pub fn animate_atten_vs_time<R: FrameRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        freq_mhz: f64,
        options: &AnimationOptions,
    ) -> Result<()> {
        let title = format!("Attenuation at {} MHz", freq_mhz);
        self.animate_with(&title, renderer, options, |frame, dir| {
            frame.atten(dir, freq_mhz, &options.query)
        })
    }

    /// F-layer refraction angle at `freq_mhz` over time.
    pub fn animate_refr_vs_time<R: FrameRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        freq_mhz: f64,
        options: &AnimationOptions,
    ) -> Result<()> {
        let title = format!("Refraction at {} MHz", freq_mhz);
        self.animate_with(&title, renderer, options, |frame, dir| {
            frame.refr(dir, freq_mhz, &options.query)
        })
    }
}
