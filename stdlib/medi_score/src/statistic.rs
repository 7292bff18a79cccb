//! Score statistics for a hypothesized risk difference.

use log::debug;
use medi_normal::phi;

use crate::config::ScoreConfig;
use crate::rmle::{ObservedRates, RestrictedMle, RmleStrategy};
use crate::variance::rmle_variance;

/// A defined score statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreResult {
    pub variance: f64,
    pub z_statistic: f64,
    /// One-sided upper-tail p-value `1 - phi(z)`
    pub p_value: f64,
}

/// `z = (observed_diff - delta) / sqrt(variance)`.
///
/// Returns `None` when the variance is non-finite or not positive; the
/// statistic is undefined there and must not be read as `z = 0`.
pub fn score_statistic(observed_diff: f64, delta: f64, variance: f64) -> Option<ScoreResult> {
    if !variance.is_finite() || variance <= 0.0 {
        debug!("score statistic undefined: variance={variance}");
        return None;
    }
    let z_statistic = (observed_diff - delta) / variance.sqrt();
    if z_statistic.is_nan() {
        return None;
    }
    Some(ScoreResult {
        variance,
        z_statistic,
        p_value: upper_tail_p(z_statistic),
    })
}

/// P(Z >= z)
pub fn upper_tail_p(z: f64) -> f64 {
    1.0 - phi(z)
}

/// P(Z <= z)
pub fn lower_tail_p(z: f64) -> f64 {
    phi(z)
}

/// One run of solver, variance and statistic at a single hypothesized difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTest {
    pub delta: f64,
    pub strategy: RmleStrategy,
    pub rmle: RestrictedMle,
    pub variance: f64,
    pub statistic: Option<ScoreResult>,
}

impl ScoreTest {
    /// The z statistic, NaN when undefined
    pub fn z(&self) -> f64 {
        self.statistic.map_or(f64::NAN, |s| s.z_statistic)
    }
}

/// Test `H0: p2 - p1 = delta` with the given restricted-MLE strategy.
pub fn score_test(
    obs: &ObservedRates,
    delta: f64,
    strategy: RmleStrategy,
    config: &ScoreConfig,
) -> ScoreTest {
    let rmle = strategy.solve(obs, delta, config);
    let variance = rmle_variance(
        &rmle,
        obs.n1,
        obs.n2,
        strategy.applies_small_sample_correction(),
    );
    ScoreTest {
        delta,
        strategy,
        rmle,
        variance,
        statistic: score_statistic(obs.difference(), delta, variance),
    }
}
