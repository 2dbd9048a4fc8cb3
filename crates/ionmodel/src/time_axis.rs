//! Discrete sample instants of the model.
//!
//! All instants are aligned to `origin + k·step`. The axis starts dense
//! over `[start, end]` and may later receive extra aligned instants outside
//! that window (on-demand recalculation), so it can contain gaps.
//! Interpolation is only performed between neighbours exactly one step apart.

use chrono::{DateTime, Duration, Utc};
use crate::error::{IonModelError, Result};

/// Where a query time falls on the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeBracket {
    /// Coincides with a stored instant.
    Exact(usize),
    /// Strictly between two neighbouring instants; `weight` is the share of `hi`.
    Between { lo: usize, hi: usize, weight: f64 },
}

impl TimeBracket {
    /// Linear blend of two stored values.
    pub fn blend(&self, lo_value: f64, hi_value: f64) -> f64 {
        match *self {
            Self::Exact(_) => lo_value,
            Self::Between { weight, .. } => lo_value + (hi_value - lo_value) * weight,
        }
    }

    /// Indices of the stored instants involved (equal for exact hits).
    pub fn indices(&self) -> (usize, usize) {
        match *self {
            Self::Exact(i) => (i, i),
            Self::Between { lo, hi, .. } => (lo, hi),
        }
    }
}

/// Sorted, step-aligned sequence of sample instants.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    origin: DateTime<Utc>,
    step: Duration,
    instants: Vec<DateTime<Utc>>,
}

impl TimeAxis {
    /// `ceil((end - start) / step) + 1` instants starting at `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Result<Self> {
        if end <= start {
            return Err(IonModelError::configuration(format!(
                "time window end {} must be after start {}",
                end, start
            )));
        }
        if step < Duration::seconds(1) {
            return Err(IonModelError::configuration(
                "time step must be at least one second",
            ));
        }
        let span = (end - start).num_milliseconds();
        let step_ms = step.num_milliseconds();
        let count = (span + step_ms - 1) / step_ms + 1;
        let instants = (0..count as i32).map(|k| start + step * k).collect();
        Ok(Self {
            origin: start,
            step,
            instants,
        })
    }

    /// Hourly samples.
    pub fn hourly(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        Self::new(start, end, Duration::hours(1))
    }

    /// `models_per_hour` samples per hour.
    pub fn with_models_per_hour(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        models_per_hour: u32,
    ) -> Result<Self> {
        Self::new(start, end, step_for(models_per_hour)?)
    }

    /// Rebuild an axis from stored instants (used when loading a model).
    pub fn from_instants(
        origin: DateTime<Utc>,
        step: Duration,
        instants: Vec<DateTime<Utc>>,
    ) -> Result<Self> {
        if instants.is_empty() {
            return Err(IonModelError::persistence("time axis has no instants"));
        }
        if step < Duration::seconds(1) {
            return Err(IonModelError::persistence("time step must be at least one second"));
        }
        if instants.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IonModelError::persistence(
                "time axis instants are not strictly increasing",
            ));
        }
        let axis = Self {
            origin,
            step,
            instants,
        };
        if let Some(bad) = axis.instants.iter().find(|t| !axis.is_aligned(**t)) {
            return Err(IonModelError::persistence(format!(
                "instant {} is not aligned to the {} s step",
                bad,
                step.num_seconds()
            )));
        }
        Ok(axis)
    }

    pub fn instants(&self) -> &[DateTime<Utc>] {
        &self.instants
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    pub fn first(&self) -> DateTime<Utc> {
        self.instants[0]
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.instants[self.instants.len() - 1]
    }

    pub fn position(&self, dt: DateTime<Utc>) -> Option<usize> {
        self.instants.binary_search(&dt).ok()
    }

    /// Locate `dt` between stored instants.
    ///
    /// Returns `None` outside the covered instants or inside a gap wider
    /// than one step.
    pub fn bracket(&self, dt: DateTime<Utc>) -> Option<TimeBracket> {
        match self.instants.binary_search(&dt) {
            Ok(i) => Some(TimeBracket::Exact(i)),
            Err(pos) if pos == 0 || pos == self.instants.len() => None,
            Err(pos) => {
                let (lo, hi) = (pos - 1, pos);
                let span = self.instants[hi] - self.instants[lo];
                if span > self.step {
                    return None;
                }
                let weight = (dt - self.instants[lo]).num_milliseconds() as f64
                    / span.num_milliseconds() as f64;
                Some(TimeBracket::Between { lo, hi, weight })
            }
        }
    }

    /// The aligned instants around `dt` (equal when `dt` is aligned).
    pub fn aligned_bracket(&self, dt: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let offset = (dt - self.origin).num_milliseconds();
        let step_ms = self.step.num_milliseconds();
        let k = offset.div_euclid(step_ms);
        let lo = self.origin + Duration::milliseconds(k * step_ms);
        if lo == dt {
            (lo, lo)
        } else {
            (lo, lo + self.step)
        }
    }

    /// Insert an aligned instant, returning its index. Existing instants
    /// are left untouched and their index is returned.
    pub fn insert(&mut self, dt: DateTime<Utc>) -> Result<usize> {
        if !self.is_aligned(dt) {
            return Err(IonModelError::out_of_range(format!(
                "instant {} is not aligned to the time axis",
                dt
            )));
        }
        match self.instants.binary_search(&dt) {
            Ok(i) => Ok(i),
            Err(pos) => {
                self.instants.insert(pos, dt);
                Ok(pos)
            }
        }
    }

    fn is_aligned(&self, dt: DateTime<Utc>) -> bool {
        (dt - self.origin)
            .num_milliseconds()
            .rem_euclid(self.step.num_milliseconds())
            == 0
    }
}

/// Step length for a number of samples per hour.
pub fn step_for(models_per_hour: u32) -> Result<Duration> {
    if models_per_hour == 0 || models_per_hour > 3600 {
        return Err(IonModelError::configuration(format!(
            "models per hour must be in [1, 3600], got {}",
            models_per_hour
        )));
    }
    Ok(Duration::seconds(3600 / models_per_hour as i64))
}
