//! Tuning knobs for the iterative parts of the engine.
//!
//! The defaults reproduce the published Farrington-Manning and
//! Miettinen-Nurminen procedures; changing them changes reported values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for the Newton-Raphson (Farrington-Manning) solver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NewtonConfig {
    /// Maximum number of Newton steps
    pub max_iterations: u32,
    /// Stop once a step moves `p1` by less than this
    pub step_tolerance: f64,
    /// Lower edge of the range the estimate is clipped into
    pub clip_low: f64,
    /// Upper edge of the range the estimate is clipped into
    pub clip_high: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            step_tolerance: 1e-8,
            clip_low: 0.001,
            clip_high: 0.999,
        }
    }
}

/// Settings for the bisection (Miettinen-Nurminen) solver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BisectionConfig {
    /// Maximum number of halvings
    pub max_iterations: u32,
    /// Stop once the score is this close to zero
    pub score_tolerance: f64,
    /// Stop once the bracket is narrower than this
    pub width_tolerance: f64,
    /// Differences smaller than this use the pooled rate directly
    pub equal_rates_threshold: f64,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            score_tolerance: 1e-12,
            width_tolerance: 1e-12,
            equal_rates_threshold: 1e-10,
        }
    }
}

/// Settings for confidence-interval inversion
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InversionConfig {
    /// Distance from the observed difference searched on each side
    pub search_radius: f64,
    /// Candidate differences are clipped into `(-bound, bound)`
    pub bound: f64,
    /// Maximum number of halvings per bound
    pub max_iterations: u32,
    /// Stop once the bracket is narrower than this
    pub width_tolerance: f64,
}

impl Default for InversionConfig {
    fn default() -> Self {
        Self {
            search_radius: 0.5,
            bound: 0.9999,
            max_iterations: 100,
            width_tolerance: 1e-8,
        }
    }
}

/// Configuration shared by every solver and inverter call
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScoreConfig {
    /// Probabilities are kept inside `(epsilon, 1 - epsilon)`
    pub epsilon: f64,
    pub newton: NewtonConfig,
    pub bisection: BisectionConfig,
    pub inversion: InversionConfig,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-8,
            newton: NewtonConfig::default(),
            bisection: BisectionConfig::default(),
            inversion: InversionConfig::default(),
        }
    }
}

#[cfg(feature = "serde")]
impl ScoreConfig {
    /// Read a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
