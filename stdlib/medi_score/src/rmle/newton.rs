//! Farrington-Manning restricted MLE by Newton-Raphson iteration.

use log::{debug, trace};

use super::{
    constrained_information, constrained_score, FeasibleInterval, ObservedRates, RestrictedMle,
    Termination,
};
use crate::config::NewtonConfig;

/// Solve for the restricted MLE starting from the pooled rate shifted by `-delta / 2`.
///
/// When an iterate pushes `p2` (or `p1`) out of `(0, 1)` the iteration stops and
/// the current `p1` is re-clipped into the feasible part of
/// `[clip_low, clip_high]` without further refinement. The returned pair is
/// always finite.
pub fn solve(obs: &ObservedRates, delta: f64, config: &NewtonConfig) -> RestrictedMle {
    let mut p1 = (obs.pooled() - delta / 2.0).clamp(config.clip_low, config.clip_high);
    let mut iterations = 0;
    let mut termination = Termination::IterationLimit;

    while iterations < config.max_iterations {
        let p2 = p1 + delta;
        if !(in_unit_interval(p1) && in_unit_interval(p2)) {
            debug!(
                "newton: iterate left the unit interval after {iterations} steps (p1={p1}, p2={p2}, delta={delta})"
            );
            termination = Termination::Fallback;
            break;
        }

        let score = constrained_score(obs, p1, delta);
        let information = constrained_information(obs, p1, delta);
        if !score.is_finite() || !information.is_finite() || information <= 0.0 {
            debug!("newton: degenerate derivatives at p1={p1} (score={score}, information={information})");
            termination = Termination::Fallback;
            break;
        }

        let step = score / information;
        p1 += step;
        iterations += 1;
        trace!("newton: iteration {iterations} p1={p1} step={step}");

        if step.abs() < config.step_tolerance {
            termination = Termination::Converged;
            break;
        }
    }

    if termination == Termination::IterationLimit {
        debug!(
            "newton: no convergence within {} iterations (delta={delta})",
            config.max_iterations
        );
    }

    let (p1_star, p2_star) = recenter(p1, delta, config);
    if termination == Termination::Converged && p1_star != p1 {
        // the stationary point lies outside the clipping range
        termination = Termination::Fallback;
    }

    RestrictedMle {
        p1: p1_star,
        p2: p2_star,
        iterations,
        termination,
    }
}

fn in_unit_interval(p: f64) -> bool {
    p > 0.0 && p < 1.0
}

/// Clip `p1` so that both `p1` and `p1 + delta` lie in `[clip_low, clip_high]`.
fn recenter(p1: f64, delta: f64, config: &NewtonConfig) -> (f64, f64) {
    match FeasibleInterval::within(delta, config.clip_low, config.clip_high) {
        Some(interval) => {
            let p1 = interval.clamp(if p1.is_finite() { p1 } else { interval.low });
            (p1, p1 + delta)
        }
        None => {
            // |delta| too large for the clipping range; keep both inside it
            let p1 = ((1.0 - delta) / 2.0).clamp(config.clip_low, config.clip_high);
            (p1, (p1 + delta).clamp(config.clip_low, config.clip_high))
        }
    }
}
