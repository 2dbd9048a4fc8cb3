//! Parallel evaluation of a data source over the model lattice.
//!
//! One rayon task per (time, pixel) column; each task fills the
//! pre-addressed altitude rows of the density and temperature buffers, so
//! results do not depend on completion order and no locking is needed.
//! The first coordinate that exhausts its retry budget aborts the whole
//! pass and the partially filled buffers are dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{IonModelError, Result};
use crate::model::LayerGrid;
use crate::source::{IonosphereSource, PlasmaSample, SampleCoordinate};
use crate::types::{GeoPoint, Layer};

/// Observer of computation progress. Purely informational.
pub trait Progress: Send + Sync {
    /// A pass over `total` columns is starting.
    fn start(&self, _label: &str, _total: usize) {}

    /// `done` of `total` columns have been filled.
    fn advance(&self, label: &str, done: usize, total: usize);

    /// The pass finished successfully.
    fn finish(&self, _label: &str) {}
}

/// Logs progress through `tracing` roughly every 10%.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn start(&self, label: &str, total: usize) {
        debug!(label = %label, total, "Sampling started");
    }

    fn advance(&self, label: &str, done: usize, total: usize) {
        let percent = if total == 0 { 100 } else { done * 100 / total };
        debug!(label = %label, done, total, percent, "Sampling progress");
    }
}

/// Discards progress reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&self, _label: &str, _done: usize, _total: usize) {}
}

/// The lattice of one layer to evaluate.
#[derive(Debug, Clone, Copy)]
pub struct SamplingJob<'a> {
    pub layer: Layer,
    pub instants: &'a [DateTime<Utc>],
    /// Pixel centers, in storage order.
    pub points: &'a [GeoPoint],
    /// Altitudes in km, ascending.
    pub altitudes: &'a [f64],
}

impl SamplingJob<'_> {
    /// Number of (time, pixel) columns.
    pub fn columns(&self) -> usize {
        self.instants.len() * self.points.len()
    }

    /// Number of individual coordinates.
    pub fn samples(&self) -> usize {
        self.columns() * self.altitudes.len()
    }
}

/// Fan-out evaluator of an [`IonosphereSource`].
pub struct ParallelSampler<'a> {
    source: &'a dyn IonosphereSource,
    retries: u32,
    progress: &'a dyn Progress,
    label: Option<String>,
}

impl<'a> ParallelSampler<'a> {
    /// Sampler with `retries` extra attempts per coordinate.
    pub fn new(source: &'a dyn IonosphereSource, retries: u32) -> Self {
        Self {
            source,
            retries,
            progress: &TracingProgress,
            label: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Prefix for progress labels (the layer name is appended).
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// Evaluate every coordinate of the job into a dense layer grid.
    pub fn sample_layer(&self, job: &SamplingJob<'_>) -> Result<LayerGrid> {
        let n_alt = job.altitudes.len();
        let n_pix = job.points.len();
        let columns = job.columns();
        if n_alt == 0 {
            return Err(IonModelError::configuration("sampling job has no altitudes"));
        }

        let label = match &self.label {
            Some(prefix) => format!("{}: {}", prefix, job.layer),
            None => job.layer.to_string(),
        };
        let started = Instant::now();
        self.progress.start(&label, columns);

        let mut density = vec![0.0; columns * n_alt];
        let mut temperature = vec![0.0; columns * n_alt];
        let done = AtomicUsize::new(0);
        let report_every = (columns / 10).max(1);

        density
            .par_chunks_mut(n_alt)
            .zip(temperature.par_chunks_mut(n_alt))
            .enumerate()
            .try_for_each(|(column, (dens_row, temp_row))| -> Result<()> {
                let time = job.instants[column / n_pix];
                let point = job.points[column % n_pix];
                for (a, &alt_km) in job.altitudes.iter().enumerate() {
                    let coord = SampleCoordinate {
                        layer: job.layer,
                        time,
                        lat: point.lat,
                        lon: point.lon,
                        alt_km,
                    };
                    let sample = self.sample_with_retry(&coord)?;
                    dens_row[a] = sample.density;
                    temp_row[a] = sample.temperature;
                }
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if finished % report_every == 0 || finished == columns {
                    self.progress.advance(&label, finished, columns);
                }
                Ok(())
            })?;

        self.progress.finish(&label);
        info!(
            layer = %job.layer,
            source = %self.source.name(),
            times = job.instants.len(),
            pixels = n_pix,
            altitudes = n_alt,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Layer sampled"
        );

        LayerGrid::new(job.instants.len(), n_pix, n_alt, density, temperature)
    }

    /// Query one coordinate, averaging sub-samples, retrying bounded times.
    fn sample_with_retry(&self, coord: &SampleCoordinate) -> Result<PlasmaSample> {
        let attempts = self.retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.source.sample(coord) {
                Ok(subsamples) => match PlasmaSample::mean(&subsamples) {
                    Some(mean) if mean.is_valid() => return Ok(mean),
                    Some(mean) => {
                        last_error = format!(
                            "non-physical sample (density={}, temperature={})",
                            mean.density, mean.temperature
                        )
                    }
                    None => last_error = "source returned no samples".to_string(),
                },
                Err(e) => last_error = e.to_string(),
            }
            if attempt < attempts {
                warn!(coordinate = %coord, attempt, error = %last_error, "Retrying sample");
            }
        }

        Err(IonModelError::DataSource {
            coordinate: *coord,
            attempts,
            message: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use chrono::TimeZone;
    use std::sync::Mutex;

    type Samples = std::result::Result<Vec<PlasmaSample>, SourceError>;

    struct RampSource;

    impl IonosphereSource for RampSource {
        fn sample(&self, c: &SampleCoordinate) -> Samples {
            Ok(vec![
                PlasmaSample::new(c.alt_km * 1.0e6 + c.lat.abs(), 100.0),
                PlasmaSample::new(c.alt_km * 1.0e6 + c.lat.abs(), 300.0),
            ])
        }
    }

    /// Fails the first `failures` calls at every coordinate.
    struct FlakySource {
        failures: usize,
        seen: Mutex<Vec<(i64, u64)>>,
    }

    impl IonosphereSource for FlakySource {
        fn sample(&self, c: &SampleCoordinate) -> Samples {
            let key = (c.time.timestamp(), (c.alt_km * 1000.0) as u64 ^ c.lat.to_bits());
            let mut seen = self.seen.lock().unwrap();
            let count = seen.iter().filter(|k| **k == key).count();
            seen.push(key);
            if count < self.failures {
                Err(SourceError::Unavailable("timeout".into()))
            } else {
                Ok(vec![PlasmaSample::new(1.0e10, 1000.0)])
            }
        }
    }

    struct NanSource;

    impl IonosphereSource for NanSource {
        fn sample(&self, c: &SampleCoordinate) -> Samples {
            let density = if c.alt_km > 80.0 { f64::NAN } else { 1.0 };
            Ok(vec![PlasmaSample::new(density, 200.0)])
        }
    }

    fn instants() -> Vec<DateTime<Utc>> {
        vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
        ]
    }

    fn points() -> Vec<GeoPoint> {
        vec![GeoPoint::new(10.0, 0.0), GeoPoint::new(-20.0, 5.0), GeoPoint::new(30.0, 9.0)]
    }

    #[test]
    fn test_fills_every_slot_with_averages() {
        let (instants, points, alts) = (instants(), points(), vec![60.0, 75.0, 90.0]);
        let job = SamplingJob {
            layer: Layer::D,
            instants: &instants,
            points: &points,
            altitudes: &alts,
        };
        let grid = ParallelSampler::new(&RampSource, 0)
            .with_progress(&NoProgress)
            .sample_layer(&job)
            .unwrap();
        assert_eq!(grid.shape(), (2, 3, 3));
        for t in 0..2 {
            for (p, point) in points.iter().enumerate() {
                for (a, alt) in alts.iter().enumerate() {
                    assert_eq!(grid.density(t, p, a), alt * 1.0e6 + point.lat.abs());
                    assert_eq!(grid.temperature(t, p, a), 200.0);
                }
            }
        }
    }

    #[test]
    fn test_retries_transient_failures() {
        let (instants, points, alts) = (instants(), points(), vec![70.0, 80.0]);
        let job = SamplingJob {
            layer: Layer::D,
            instants: &instants,
            points: &points,
            altitudes: &alts,
        };
        let source = FlakySource {
            failures: 2,
            seen: Mutex::new(Vec::new()),
        };
        let grid = ParallelSampler::new(&source, 2)
            .with_progress(&NoProgress)
            .sample_layer(&job)
            .unwrap();
        assert_eq!(grid.density(1, 2, 1), 1.0e10);
    }

    #[test]
    fn test_exhausted_retries_name_the_coordinate() {
        let (instants, points, alts) = (instants(), points(), vec![70.0]);
        let job = SamplingJob {
            layer: Layer::F,
            instants: &instants,
            points: &points,
            altitudes: &alts,
        };
        let source = FlakySource {
            failures: 5,
            seen: Mutex::new(Vec::new()),
        };
        let err = ParallelSampler::new(&source, 2)
            .with_progress(&NoProgress)
            .sample_layer(&job)
            .unwrap_err();
        match err {
            IonModelError::DataSource {
                coordinate,
                attempts,
                message,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(coordinate.layer, Layer::F);
                assert_eq!(coordinate.alt_km, 70.0);
                assert!(message.contains("timeout"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_samples_are_errors() {
        let (instants, points, alts) = (instants(), points(), vec![70.0, 85.0]);
        let job = SamplingJob {
            layer: Layer::D,
            instants: &instants,
            points: &points,
            altitudes: &alts,
        };
        let err = ParallelSampler::new(&NanSource, 1)
            .with_progress(&NoProgress)
            .sample_layer(&job)
            .unwrap_err();
        assert!(matches!(
            err,
            IonModelError::DataSource { coordinate, .. } if coordinate.alt_km == 85.0
        ));
    }

    #[test]
    fn test_deterministic_across_runs() {
        let (instants, points, alts) = (instants(), points(), vec![60.0, 90.0]);
        let job = SamplingJob {
            layer: Layer::D,
            instants: &instants,
            points: &points,
            altitudes: &alts,
        };
        let sampler = ParallelSampler::new(&RampSource, 0).with_progress(&NoProgress);
        let a = sampler.sample_layer(&job).unwrap();
        let b = sampler.sample_layer(&job).unwrap();
        assert_eq!(a, b);
    }

    struct CountingProgress(AtomicUsize);

    impl Progress for CountingProgress {
        fn advance(&self, _label: &str, done: usize, total: usize) {
            assert!(done <= total);
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_progress_reports_completion() {
        let (instants, points, alts) = (instants(), points(), vec![60.0]);
        let job = SamplingJob {
            layer: Layer::D,
            instants: &instants,
            points: &points,
            altitudes: &alts,
        };
        let progress = CountingProgress(AtomicUsize::new(0));
        ParallelSampler::new(&RampSource, 0)
            .with_progress(&progress)
            .with_label(Some("test".into()))
            .sample_layer(&job)
            .unwrap();
        assert!(progress.0.load(Ordering::Relaxed) >= 1);
    }
}
