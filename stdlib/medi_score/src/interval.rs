//! Confidence intervals for the risk difference `p2 - p1`.
//!
//! The Miettinen-Nurminen interval is built by inverting the score test: each
//! bound is the difference at which the statistic crosses `±z_critical`. Every
//! bisection step reruns the whole solver, variance and statistic chain.

use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::ScoreConfig;
use crate::rmle::{ObservedRates, RmleStrategy};
use crate::statistic::score_test;
use crate::variance::wald_variance;

/// A two-sided interval over the risk-difference scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// The NaN interval reported when no interval can be formed.
    pub fn undefined() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    pub fn is_defined(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Invert the Miettinen-Nurminen score test at `z_critical`.
///
/// The lower bound solves `z(delta) = z_critical` on
/// `[diff - radius, diff]`, the upper bound solves `z(delta) = -z_critical` on
/// `[diff, diff + radius]`, both clipped to `(-bound, bound)`.
pub fn invert_score_test(
    obs: &ObservedRates,
    z_critical: f64,
    config: &ScoreConfig,
) -> ConfidenceInterval {
    if !z_critical.is_finite() {
        debug!("score inversion skipped: z_critical={z_critical}");
        return ConfidenceInterval::undefined();
    }
    let settings = &config.inversion;
    let diff = obs.difference().clamp(-settings.bound, settings.bound);
    let z_at = |delta: f64| score_test(obs, delta, RmleStrategy::Bisection, config).z();

    // z decreases in delta: above the lower bound it is still larger than z_critical
    let lower = bisect(
        (diff - settings.search_radius).max(-settings.bound),
        diff,
        |delta| z_at(delta) > z_critical,
        config,
    );
    let upper = bisect(
        diff,
        (diff + settings.search_radius).min(settings.bound),
        |delta| z_at(delta) > -z_critical,
        config,
    );
    debug!("score inversion: diff={diff} z={z_critical} -> [{lower}, {upper}]");
    ConfidenceInterval::new(lower, upper)
}

/// Narrow `[low, high]` toward the point where `below_root` flips from true to false.
fn bisect(
    mut low: f64,
    mut high: f64,
    below_root: impl Fn(f64) -> bool,
    config: &ScoreConfig,
) -> f64 {
    let settings = &config.inversion;
    for iteration in 0..settings.max_iterations {
        if high - low < settings.width_tolerance {
            break;
        }
        let mid = 0.5 * (low + high);
        if below_root(mid) {
            low = mid;
        } else {
            high = mid;
        }
        trace!("score inversion: iteration {iteration} bracket=[{low}, {high}]");
    }
    0.5 * (low + high)
}

/// `diff ± z * se` with the unrestricted variance.
pub fn wald_interval(obs: &ObservedRates, z_critical: f64, eps: f64) -> ConfidenceInterval {
    if !z_critical.is_finite() {
        return ConfidenceInterval::undefined();
    }
    let half_width = z_critical * wald_variance(obs, eps).sqrt();
    let diff = obs.difference();
    ConfidenceInterval::new(diff - half_width, diff + half_width)
}

/// Wilson score interval for a single proportion observed as `rate` over `n` trials.
pub fn wilson_interval(rate: f64, n: f64, z_critical: f64) -> ConfidenceInterval {
    if !z_critical.is_finite() || n <= 0.0 {
        return ConfidenceInterval::undefined();
    }
    let z2 = z_critical * z_critical;
    let denominator = 1.0 + z2 / n;
    let center = (rate + z2 / (2.0 * n)) / denominator;
    let half_width =
        z_critical / denominator * (rate * (1.0 - rate) / n + z2 / (4.0 * n * n)).sqrt();
    ConfidenceInterval::new(
        (center - half_width).max(0.0),
        (center + half_width).min(1.0),
    )
}

/// Newcombe's hybrid score interval for `p2 - p1`, combining the two Wilson intervals.
pub fn newcombe_interval(obs: &ObservedRates, z_critical: f64) -> ConfidenceInterval {
    let first = wilson_interval(obs.p1, obs.n1, z_critical);
    let second = wilson_interval(obs.p2, obs.n2, z_critical);
    if !(first.is_defined() && second.is_defined()) {
        return ConfidenceInterval::undefined();
    }
    let diff = obs.difference();
    let lower = diff - ((obs.p2 - second.lower).powi(2) + (first.upper - obs.p1).powi(2)).sqrt();
    let upper = diff + ((second.upper - obs.p2).powi(2) + (obs.p1 - first.lower).powi(2)).sqrt();
    ConfidenceInterval::new(lower, upper)
}
