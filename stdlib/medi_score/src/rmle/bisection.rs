//! Miettinen-Nurminen restricted MLE by bisection on the constrained score.

use log::{debug, trace};

use super::{constrained_score, FeasibleInterval, ObservedRates, RestrictedMle, Termination};
use crate::config::BisectionConfig;
use crate::sample::clip_probability;

/// Bisect the constrained score over the feasible interval for `p1`.
///
/// A difference below `equal_rates_threshold` short-circuits to the pooled rate.
/// If the score does not change sign between the interval ends, the endpoint
/// with the score closest to zero is returned.
pub fn solve(
    obs: &ObservedRates,
    delta: f64,
    eps: f64,
    config: &BisectionConfig,
) -> RestrictedMle {
    if delta.abs() < config.equal_rates_threshold {
        let pooled = clip_probability(obs.pooled(), eps);
        return RestrictedMle {
            p1: pooled,
            p2: pooled,
            iterations: 0,
            termination: Termination::ClosedForm,
        };
    }

    let Some(interval) = FeasibleInterval::for_difference(delta, eps) else {
        debug!("bisection: no feasible p1 for delta={delta}");
        let p1 = clip_probability((1.0 - delta) / 2.0, eps);
        return RestrictedMle {
            p1,
            p2: clip_probability(p1 + delta, eps),
            iterations: 0,
            termination: Termination::Fallback,
        };
    };

    let (mut low, mut high) = (interval.low, interval.high);
    let score_low = constrained_score(obs, low, delta);
    let score_high = constrained_score(obs, high, delta);

    if score_low == 0.0 || score_high == 0.0 || score_low.signum() == score_high.signum() {
        let p1 = if score_low.abs() <= score_high.abs() {
            low
        } else {
            high
        };
        debug!(
            "bisection: score keeps its sign on [{low}, {high}] (delta={delta}), saturating at p1={p1}"
        );
        return RestrictedMle {
            p1,
            p2: p1 + delta,
            iterations: 0,
            termination: Termination::Saturated,
        };
    }

    let mut p1 = 0.5 * (low + high);
    let mut iterations = 0;
    let mut termination = Termination::IterationLimit;
    while iterations < config.max_iterations {
        p1 = 0.5 * (low + high);
        let score = constrained_score(obs, p1, delta);
        iterations += 1;
        trace!("bisection: iteration {iterations} p1={p1} score={score}");

        if score.abs() < config.score_tolerance || high - low < config.width_tolerance {
            termination = Termination::Converged;
            break;
        }
        if score.signum() == score_low.signum() {
            low = p1;
        } else {
            high = p1;
        }
    }

    if termination == Termination::IterationLimit {
        debug!("bisection: iteration cap reached (delta={delta}, width={})", high - low);
    }

    RestrictedMle {
        p1,
        p2: p1 + delta,
        iterations,
        termination,
    }
}
