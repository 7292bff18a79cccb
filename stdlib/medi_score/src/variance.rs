//! Plug-in variance of the risk-difference estimator.

use crate::rmle::{ObservedRates, RestrictedMle};
use crate::sample::clip_probability;

/// `N / (N - 1)` with `N = n1 + n2`.
pub fn small_sample_factor(n1: f64, n2: f64) -> f64 {
    let total = n1 + n2;
    total / (total - 1.0)
}

/// Variance of `p2 - p1` evaluated at a restricted MLE.
///
/// Miettinen-Nurminen applies the `N / (N - 1)` correction, Farrington-Manning
/// does not; callers pass `RmleStrategy::applies_small_sample_correction()`.
pub fn rmle_variance(
    rmle: &RestrictedMle,
    n1: f64,
    n2: f64,
    small_sample_correction: bool,
) -> f64 {
    let variance = binomial_variance(rmle.p1, n1) + binomial_variance(rmle.p2, n2);
    if small_sample_correction {
        variance * small_sample_factor(n1, n2)
    } else {
        variance
    }
}

/// Unrestricted (Wald) variance from the observed rates clipped into `(eps, 1 - eps)`.
pub fn wald_variance(obs: &ObservedRates, eps: f64) -> f64 {
    binomial_variance(clip_probability(obs.p1, eps), obs.n1)
        + binomial_variance(clip_probability(obs.p2, eps), obs.n2)
}

fn binomial_variance(p: f64, n: f64) -> f64 {
    p * (1.0 - p) / n
}
