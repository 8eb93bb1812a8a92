use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod grid;
pub mod network;
pub mod rejection;
pub mod serialize;
pub mod spatial;
pub mod step;
pub mod trajectory;

pub type Time = f64;

/// Per-cell molecule counts, one entry per species.
pub type Counts = Array1<i32>;

/// Per-cell real-valued concentrations, one entry per species.
pub type Concentrations = Array1<f64>;

/// One non-negative rate per reaction.
pub type Hazards = Array1<f64>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("coordinate {coord:?} outside grid extent {extent:?}")]
    OutOfBounds {
        coord: Vec<usize>,
        extent: Vec<usize>,
    },
    #[error("grid shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: Vec<usize>,
        right: Vec<usize>,
    },
    #[error("invalid hazard bounds: min {min}, max {max}")]
    InvalidHazardBounds { min: f64, max: f64 },
    #[error("reaction {reaction} produced a negative or non-finite hazard ({value})")]
    NegativeHazard { reaction: usize, value: f64 },
    #[error("species {species} has a negative diffusion coefficient ({value})")]
    NegativeDiffusion { species: usize, value: f64 },
}

/// Conservative bounds on any single candidate event's rate anywhere in the
/// grid, valid for the duration of one stepper call. `max` must be a true
/// upper bound for the simulation to be correct; a too-loose `max` only
/// costs rejected draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HazardBounds {
    pub min: f64,
    pub max: f64,
}

impl HazardBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, SimError> {
        if !(min >= 0.0) || !(max >= min) || !max.is_finite() {
            return Err(SimError::InvalidHazardBounds { min, max });
        }
        Ok(HazardBounds { min, max })
    }
}

pub(crate) fn check_hazards(hazards: &Hazards) -> Result<(), SimError> {
    for (reaction, &value) in hazards.iter().enumerate() {
        if !(value >= 0.0) || !value.is_finite() {
            return Err(SimError::NegativeHazard { reaction, value });
        }
    }
    Ok(())
}

pub(crate) fn check_diffusion(diffusion: &Array1<f64>) -> Result<(), SimError> {
    for (species, &value) in diffusion.iter().enumerate() {
        if !(value >= 0.0) || !value.is_finite() {
            return Err(SimError::NegativeDiffusion { species, value });
        }
    }
    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn hazard_bounds_validation() {
        assert!(HazardBounds::new(0.0, 10.0).is_ok());
        assert!(HazardBounds::new(1.0, 1.0).is_ok());
        assert!(HazardBounds::new(2.0, 1.0).is_err());
        assert!(HazardBounds::new(-1.0, 1.0).is_err());
        assert!(HazardBounds::new(0.0, f64::INFINITY).is_err());
        assert!(HazardBounds::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn negative_hazard_detected() {
        assert!(check_hazards(&arr1(&[0.0, 1.5])).is_ok());
        let err = check_hazards(&arr1(&[0.2, -0.1])).unwrap_err();
        assert_eq!(
            err,
            SimError::NegativeHazard {
                reaction: 1,
                value: -0.1
            }
        );
        assert!(check_hazards(&arr1(&[f64::NAN])).is_err());
    }
}
