//! Binomial samples and the observed-rate helpers built on them.

use crate::error::{Result, ScoreError};

/// Clamp a probability into `(eps, 1 - eps)`.
pub fn clip_probability(p: f64, eps: f64) -> f64 {
    p.clamp(eps, 1.0 - eps)
}

/// Successes observed in a fixed number of independent trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProportionSample {
    successes: u64,
    trials: u64,
}

impl ProportionSample {
    /// Build a sample, rejecting `trials == 0` and `successes > trials`.
    ///
    /// ```
    /// use medi_score::ProportionSample;
    ///
    /// let arm = ProportionSample::new(80, 100).unwrap();
    /// assert_eq!(arm.rate(), 0.8);
    /// assert!(ProportionSample::new(5, 4).is_err());
    /// ```
    pub fn new(successes: u64, trials: u64) -> Result<Self> {
        if trials == 0 || successes > trials {
            return Err(ScoreError::invalid_sample(successes, trials));
        }
        Ok(Self { successes, trials })
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Observed rate `successes / trials`
    pub fn rate(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }

    /// Observed rate kept away from 0 and 1
    pub fn clipped_rate(&self, eps: f64) -> f64 {
        clip_probability(self.rate(), eps)
    }

}

/// Sample-size weighted rate of both groups combined
pub fn pooled_rate(a: &ProportionSample, b: &ProportionSample) -> f64 {
    (a.successes + b.successes) as f64 / (a.trials + b.trials) as f64
}

/// Observed risk difference `rate(b) - rate(a)`
pub fn risk_difference(a: &ProportionSample, b: &ProportionSample) -> f64 {
    b.rate() - a.rate()
}
