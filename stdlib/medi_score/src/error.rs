//! Errors raised while validating analysis inputs.
//!
//! Numerical degeneracies inside the engine are never errors; they surface as
//! NaN/infinite sentinels or `None` instead.

/// The result type for fallible constructors and parsers in this crate.
pub type Result<T> = std::result::Result<T, ScoreError>;

/// An error describing invalid input to the score engine.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Counts that cannot describe a binomial sample.
    #[error("invalid sample: {successes} successes out of {trials} trials")]
    InvalidSample {
        /// Observed successes.
        successes: u64,
        /// Number of trials.
        trials: u64,
    },

    /// A margin that is not a finite magnitude below 1.
    #[error("invalid margin {0}: expected a finite value in [0, 1)")]
    InvalidMargin(f64),

    /// A method name outside `wald`, `fm`, `mn`, `wilson`.
    #[error("unknown method `{0}` (expected one of: wald, fm, mn, wilson)")]
    UnknownMethod(String),

    /// A hypothesis name outside the supported set.
    #[error("unknown hypothesis `{0}` (expected one of: non-inferiority, superiority, equivalence)")]
    UnknownHypothesis(String),

    /// A JSON configuration or report that could not be read or written.
    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScoreError {
    pub fn invalid_sample(successes: u64, trials: u64) -> Self {
        ScoreError::InvalidSample { successes, trials }
    }
}
