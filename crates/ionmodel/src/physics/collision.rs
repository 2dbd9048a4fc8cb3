//! Electron-neutral collision frequency models.
//!
//! Each named model is an exponential fit `nu_c(h) = exp(a·h + b)` (h in km,
//! result in Hz) to the profile published by its authors.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IonModelError;

/// Collision frequency model selection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionModel {
    /// Built-in default (Aggarwal).
    #[default]
    Default,
    /// Nicolet (1953).
    Nicolet,
    /// Setty (1972).
    Setty,
    /// Aggarwal (1979).
    Aggarwal,
    /// Constant collision frequency in Hz. Zero, negative or non-finite
    /// values fall back to the default model.
    Fixed(f64),
}

impl CollisionModel {
    const NICOLET: (f64, f64) = (-0.161_845_65, 28.023_338_28);
    const SETTY: (f64, f64) = (-0.160_188_96, 26.141_323_98);
    const AGGARWAL: (f64, f64) = (-0.162_851_05, 28.723_616_54);

    /// Collision frequency in Hz at `height_km`.
    pub fn frequency(&self, height_km: f64) -> f64 {
        let (a, b) = match *self {
            Self::Nicolet => Self::NICOLET,
            Self::Setty => Self::SETTY,
            Self::Default | Self::Aggarwal => Self::AGGARWAL,
            Self::Fixed(hz) if hz.is_finite() && hz > 0.0 => return hz,
            Self::Fixed(_) => Self::AGGARWAL,
        };
        (a * height_km + b).exp()
    }
}

/// Model name or a frequency in Hz, case-insensitive. Accepts what
/// `Display` writes.
impl FromStr for CollisionModel {
    type Err = IonModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "default" => Ok(Self::Default),
            "nicolet" => Ok(Self::Nicolet),
            "setty" => Ok(Self::Setty),
            "aggarwal" | "aggrawal" => Ok(Self::Aggarwal),
            other => other
                .strip_suffix("hz")
                .unwrap_or(other)
                .trim()
                .parse::<f64>()
                .map(Self::Fixed)
                .map_err(|_| {
                    IonModelError::configuration(format!("unknown collision model '{}'", s.trim()))
                }),
        }
    }
}

impl std::fmt::Display for CollisionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Nicolet => write!(f, "nicolet"),
            Self::Setty => write!(f, "setty"),
            Self::Aggarwal => write!(f, "aggarwal"),
            Self::Fixed(hz) => write!(f, "{} Hz", hz),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_decreases_with_height() {
        for model in [CollisionModel::Nicolet, CollisionModel::Setty, CollisionModel::Aggarwal] {
            assert!(model.frequency(60.0) > model.frequency(90.0));
            let at_70 = model.frequency(70.0);
            assert!(at_70 > 1.0e6 && at_70 < 1.0e8, "{} at 70 km: {}", model, at_70);
        }
    }

    #[test]
    fn test_default_is_aggarwal() {
        assert_eq!(
            CollisionModel::Default.frequency(75.0),
            CollisionModel::Aggarwal.frequency(75.0)
        );
    }

    #[test]
    fn test_fixed_and_fallback() {
        assert_eq!(CollisionModel::Fixed(5.0e6).frequency(75.0), 5.0e6);
        let default = CollisionModel::Default.frequency(75.0);
        assert_eq!(CollisionModel::Fixed(0.0).frequency(75.0), default);
        assert_eq!(CollisionModel::Fixed(-1.0).frequency(75.0), default);
        assert_eq!(CollisionModel::Fixed(f64::NAN).frequency(75.0), default);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Nicolet".parse::<CollisionModel>().unwrap(), CollisionModel::Nicolet);
        assert_eq!("setty".parse::<CollisionModel>().unwrap(), CollisionModel::Setty);
        assert_eq!(" aggrawal ".parse::<CollisionModel>().unwrap(), CollisionModel::Aggarwal);
        assert_eq!("1e6".parse::<CollisionModel>().unwrap(), CollisionModel::Fixed(1.0e6));
        assert!(matches!(
            "bogus".parse::<CollisionModel>(),
            Err(IonModelError::Configuration(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for model in [
            CollisionModel::Default,
            CollisionModel::Nicolet,
            CollisionModel::Setty,
            CollisionModel::Aggarwal,
            CollisionModel::Fixed(2.5e6),
        ] {
            assert_eq!(model.to_string().parse::<CollisionModel>().unwrap(), model);
        }
    }
}
