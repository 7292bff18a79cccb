//! Restricted maximum-likelihood estimation of two binomial proportions.
//!
//! Both strategies maximise the joint log-likelihood of two independent
//! binomial samples subject to `p2 - p1 = delta`. Substituting `p2 = p1 + delta`
//! leaves a one-dimensional problem in `p1` whose score is strictly decreasing
//! on the feasible interval.
//!
//! The strategies differ at the boundary: Newton-Raphson
//! (Farrington-Manning) re-clips into `[0.001, 0.999]` when an iterate leaves
//! the unit interval, while bisection (Miettinen-Nurminen) saturates at the
//! feasible endpoint whose score is closest to zero.

pub mod bisection;
pub mod newton;

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::ScoreConfig;
use crate::sample::ProportionSample;

/// Observed rates and sample sizes of the two groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedRates {
    pub p1: f64,
    pub p2: f64,
    pub n1: f64,
    pub n2: f64,
}

impl ObservedRates {
    pub fn new(p1: f64, p2: f64, n1: f64, n2: f64) -> Self {
        Self { p1, p2, n1, n2 }
    }

    pub fn from_samples(reference: &ProportionSample, treatment: &ProportionSample) -> Self {
        Self {
            p1: reference.rate(),
            p2: treatment.rate(),
            n1: reference.trials() as f64,
            n2: treatment.trials() as f64,
        }
    }

    /// Sample-size weighted rate of both groups combined
    pub fn pooled(&self) -> f64 {
        (self.n1 * self.p1 + self.n2 * self.p2) / (self.n1 + self.n2)
    }

    /// Observed difference `p2 - p1`
    pub fn difference(&self) -> f64 {
        self.p2 - self.p1
    }

    /// The same data with the group labels exchanged
    pub fn swapped(&self) -> Self {
        Self {
            p1: self.p2,
            p2: self.p1,
            n1: self.n2,
            n2: self.n1,
        }
    }
}

/// How a solver arrived at its estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Termination {
    /// Equal-rates shortcut: the pooled rate, no iteration
    ClosedForm,
    /// The stopping rule was met
    Converged,
    /// The score kept one sign on the feasible interval; an endpoint was returned
    Saturated,
    /// An iterate left the unit interval and was re-clipped without refinement
    Fallback,
    /// The iteration cap was reached first
    IterationLimit,
}

/// A restricted MLE `(p1, p2)` with `p2 - p1` equal to the tested difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestrictedMle {
    pub p1: f64,
    pub p2: f64,
    pub iterations: u32,
    pub termination: Termination,
}

impl RestrictedMle {
    pub fn difference(&self) -> f64 {
        self.p2 - self.p1
    }

    /// Whether the estimate is the constrained maximiser, as opposed to a
    /// clipped or truncated approximation. Reported values never depend on it.
    pub fn converged(&self) -> bool {
        matches!(
            self.termination,
            Termination::ClosedForm | Termination::Converged | Termination::Saturated
        )
    }
}

/// Values of `p1` keeping both `p1` and `p1 + delta` inside `[low_edge, high_edge]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeasibleInterval {
    pub low: f64,
    pub high: f64,
}

impl FeasibleInterval {
    /// Interval for `p1` with both probabilities in `[eps, 1 - eps]`; `None` when
    /// no such `p1` exists.
    pub fn for_difference(delta: f64, eps: f64) -> Option<Self> {
        Self::within(delta, eps, 1.0 - eps)
    }

    /// Interval for `p1` with both probabilities in `[low_edge, high_edge]`.
    pub fn within(delta: f64, low_edge: f64, high_edge: f64) -> Option<Self> {
        let low = low_edge.max(low_edge - delta);
        let high = high_edge.min(high_edge - delta);
        (low <= high).then_some(Self { low, high })
    }

    pub fn clamp(&self, p1: f64) -> f64 {
        p1.clamp(self.low, self.high)
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// First derivative in `p1` of the log-likelihood constrained by `p2 = p1 + delta`.
pub fn constrained_score(obs: &ObservedRates, p1: f64, delta: f64) -> f64 {
    let p2 = p1 + delta;
    obs.n1 * (obs.p1 - p1) / (p1 * (1.0 - p1)) + obs.n2 * (obs.p2 - p2) / (p2 * (1.0 - p2))
}

/// Negative second derivative (observed information) of the same log-likelihood.
pub fn constrained_information(obs: &ObservedRates, p1: f64, delta: f64) -> f64 {
    let p2 = p1 + delta;
    let group = |n: f64, observed: f64, p: f64| {
        n * (observed / (p * p) + (1.0 - observed) / ((1.0 - p) * (1.0 - p)))
    };
    group(obs.n1, obs.p1, p1) + group(obs.n2, obs.p2, p2)
}

/// The two restricted-MLE algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RmleStrategy {
    /// Farrington-Manning
    NewtonRaphson,
    /// Miettinen-Nurminen
    Bisection,
}

impl RmleStrategy {
    pub fn solve(self, obs: &ObservedRates, delta: f64, config: &ScoreConfig) -> RestrictedMle {
        match self {
            RmleStrategy::NewtonRaphson => newton::solve(obs, delta, &config.newton),
            RmleStrategy::Bisection => {
                bisection::solve(obs, delta, config.epsilon, &config.bisection)
            }
        }
    }

    /// Only Miettinen-Nurminen scales the variance by `N / (N - 1)`.
    pub fn applies_small_sample_correction(self) -> bool {
        matches!(self, RmleStrategy::Bisection)
    }
}

impl fmt::Display for RmleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RmleStrategy::NewtonRaphson => write!(f, "newton-raphson"),
            RmleStrategy::Bisection => write!(f, "bisection"),
        }
    }
}
