//! Method × hypothesis dispatch and report assembly.
//!
//! Group 1 is the reference arm and group 2 the treatment arm; every reported
//! difference is `p2 - p1`. For a margin `m` the tested null differences are
//! `0` (superiority), `-m` (non-inferiority), and `-m` and `+m` (equivalence,
//! two one-sided tests).

use std::fmt;
use std::str::FromStr;

use log::debug;
use medi_normal::{GlobalQuantile, QuantileSource};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::ScoreConfig;
use crate::error::{Result, ScoreError};
use crate::interval::{invert_score_test, newcombe_interval, wald_interval, ConfidenceInterval};
use crate::rmle::{ObservedRates, RmleStrategy};
use crate::sample::ProportionSample;
use crate::statistic::{lower_tail_p, score_statistic, score_test, ScoreResult};
use crate::variance::wald_variance;

/// Interval and test method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Method {
    Wald,
    FarringtonManning,
    MiettinenNurminen,
    /// The statistic is read off the interval, so it depends on `alpha` and is
    /// undefined whenever the interval is.
    WilsonNewcombe,
}

impl Method {
    pub const ALL: [Method; 4] = [
        Method::Wald,
        Method::FarringtonManning,
        Method::MiettinenNurminen,
        Method::WilsonNewcombe,
    ];

    /// The restricted-MLE strategy behind a score method
    pub fn strategy(self) -> Option<RmleStrategy> {
        match self {
            Method::FarringtonManning => Some(RmleStrategy::NewtonRaphson),
            Method::MiettinenNurminen => Some(RmleStrategy::Bisection),
            Method::Wald | Method::WilsonNewcombe => None,
        }
    }

    /// Short selector name accepted by `FromStr`
    pub fn code(self) -> &'static str {
        match self {
            Method::Wald => "wald",
            Method::FarringtonManning => "fm",
            Method::MiettinenNurminen => "mn",
            Method::WilsonNewcombe => "wilson",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Method {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wald" => Ok(Method::Wald),
            "fm" | "farrington-manning" => Ok(Method::FarringtonManning),
            "mn" | "miettinen-nurminen" => Ok(Method::MiettinenNurminen),
            "wilson" | "newcombe" | "wilson-newcombe" => Ok(Method::WilsonNewcombe),
            _ => Err(ScoreError::UnknownMethod(s.to_string())),
        }
    }
}

/// The comparative hypothesis being tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Hypothesis {
    NonInferiority,
    Superiority,
    Equivalence,
}

impl Hypothesis {
    pub const ALL: [Hypothesis; 3] = [
        Hypothesis::NonInferiority,
        Hypothesis::Superiority,
        Hypothesis::Equivalence,
    ];

    /// Null differences tested for a margin magnitude.
    pub fn null_boundary(self, margin: f64) -> NullBoundary {
        match self {
            Hypothesis::Superiority => NullBoundary::Single(0.0),
            Hypothesis::NonInferiority => NullBoundary::Single(-margin),
            Hypothesis::Equivalence => NullBoundary::TwoOneSided {
                lower: -margin,
                upper: margin,
            },
        }
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hypothesis::NonInferiority => write!(f, "non-inferiority"),
            Hypothesis::Superiority => write!(f, "superiority"),
            Hypothesis::Equivalence => write!(f, "equivalence"),
        }
    }
}

impl FromStr for Hypothesis {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "non-inferiority" | "noninferiority" | "ni" => Ok(Hypothesis::NonInferiority),
            "superiority" | "sup" => Ok(Hypothesis::Superiority),
            "equivalence" | "eq" | "tost" => Ok(Hypothesis::Equivalence),
            _ => Err(ScoreError::UnknownHypothesis(s.to_string())),
        }
    }
}

/// Differences fixed by the null hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NullBoundary {
    /// One-sided test of `H0: p2 - p1 <= delta`
    Single(f64),
    /// Both `H0: p2 - p1 <= lower` and `H0: p2 - p1 >= upper` must be rejected
    TwoOneSided { lower: f64, upper: f64 },
}

impl NullBoundary {
    fn lower(&self) -> f64 {
        match *self {
            NullBoundary::Single(delta) => delta,
            NullBoundary::TwoOneSided { lower, .. } => lower,
        }
    }

    fn upper(&self) -> f64 {
        match *self {
            NullBoundary::Single(delta) => delta,
            NullBoundary::TwoOneSided { upper, .. } => upper,
        }
    }
}

/// Success counts of the reference (group 1) and treatment (group 2) arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialData {
    pub reference: ProportionSample,
    pub treatment: ProportionSample,
}

impl TrialData {
    /// `n1`/`x1` describe the reference arm, `n2`/`x2` the treatment arm.
    pub fn new(n1: u64, x1: u64, n2: u64, x2: u64) -> Result<Self> {
        Ok(Self {
            reference: ProportionSample::new(x1, n1)?,
            treatment: ProportionSample::new(x2, n2)?,
        })
    }

    pub fn observed(&self) -> ObservedRates {
        ObservedRates::from_samples(&self.reference, &self.treatment)
    }

    /// The same trial with the arms exchanged
    pub fn swapped(&self) -> Self {
        Self {
            reference: self.treatment,
            treatment: self.reference,
        }
    }
}

/// Everything reported for one method × hypothesis analysis.
///
/// Undefined quantities are NaN; `success` is false whenever the interval is undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AnalysisReport {
    pub method: Method,
    pub hypothesis: Hypothesis,
    pub margin: f64,
    pub alpha: f64,
    pub p1: f64,
    pub p2: f64,
    pub diff: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub p_value: f64,
    pub test_statistic: f64,
    pub success: bool,
    /// False when any restricted MLE behind the report was clipped or truncated
    pub converged: bool,
}

impl AnalysisReport {
    pub fn interval(&self) -> ConfidenceInterval {
        ConfidenceInterval::new(self.ci_lower, self.ci_upper)
    }

    /// Success of a non-inferiority analysis
    pub fn is_non_inferior(&self) -> bool {
        self.hypothesis == Hypothesis::NonInferiority && self.success
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One side of a test: statistic oriented so that large values reject the null.
#[derive(Debug, Clone, Copy)]
struct SideTest {
    z: f64,
    p_value: f64,
}

impl SideTest {
    const UNDEFINED: SideTest = SideTest {
        z: f64::NAN,
        p_value: f64::NAN,
    };

    /// `H0: diff <= delta`
    fn upper(statistic: Option<ScoreResult>) -> Self {
        statistic.map_or(Self::UNDEFINED, |s| SideTest {
            z: s.z_statistic,
            p_value: s.p_value,
        })
    }

    /// `H0: diff >= delta`
    fn lower(statistic: Option<ScoreResult>) -> Self {
        statistic.map_or(Self::UNDEFINED, |s| SideTest {
            z: -s.z_statistic,
            p_value: lower_tail_p(s.z_statistic),
        })
    }
}

/// Intermediate result of one method before the decision is taken.
struct MethodOutcome {
    interval: ConfidenceInterval,
    lower_side: Option<ScoreResult>,
    upper_side: Option<ScoreResult>,
    converged: bool,
}

/// Builder and entry point for a single analysis.
///
/// ```
/// use medi_score::{Hypothesis, Method, TrialAnalysis, TrialData};
///
/// let data = TrialData::new(100, 80, 100, 85).unwrap();
/// let report = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::NonInferiority)
///     .margin(0.10)
///     .alpha(0.025)
///     .analyze(&data)
///     .unwrap();
/// assert!(report.is_non_inferior());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialAnalysis {
    method: Method,
    hypothesis: Hypothesis,
    margin: f64,
    alpha: f64,
    config: ScoreConfig,
}

impl TrialAnalysis {
    pub fn new(method: Method, hypothesis: Hypothesis) -> Self {
        Self {
            method,
            hypothesis,
            margin: 0.0,
            alpha: 0.025,
            config: ScoreConfig::default(),
        }
    }

    /// Margin magnitude; the sign of the argument is ignored
    pub fn margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// One-sided significance level
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn config(mut self, config: ScoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the analysis with the process-wide quantile cache.
    pub fn analyze(&self, data: &TrialData) -> Result<AnalysisReport> {
        self.analyze_with(data, &mut GlobalQuantile)
    }

    /// Run the analysis resolving `z_critical` through `quantiles`.
    pub fn analyze_with(
        &self,
        data: &TrialData,
        quantiles: &mut dyn QuantileSource,
    ) -> Result<AnalysisReport> {
        let margin = self.margin.abs();
        if !margin.is_finite() || margin >= 1.0 {
            return Err(ScoreError::InvalidMargin(self.margin));
        }

        let obs = data.observed();
        let diff = obs.difference();
        let null = self.hypothesis.null_boundary(margin);
        let z_critical = if self.alpha > 0.0 && self.alpha < 1.0 {
            quantiles.quantile(1.0 - self.alpha)
        } else {
            debug!("alpha={} outside (0, 1): interval undefined", self.alpha);
            f64::NAN
        };

        let outcome = match self.method {
            Method::Wald => self.wald(&obs, &null, z_critical),
            Method::FarringtonManning => {
                self.score_method(&obs, &null, z_critical, RmleStrategy::NewtonRaphson)
            }
            Method::MiettinenNurminen => {
                self.score_method(&obs, &null, z_critical, RmleStrategy::Bisection)
            }
            Method::WilsonNewcombe => self.wilson(&obs, &null, z_critical),
        };

        let interval = outcome.interval;
        let (p_value, test_statistic, success) = match null {
            NullBoundary::Single(delta) => {
                let side = SideTest::upper(outcome.lower_side);
                (side.p_value, side.z, interval.lower > delta)
            }
            NullBoundary::TwoOneSided { lower, upper } => {
                let low_side = SideTest::upper(outcome.lower_side);
                let high_side = SideTest::lower(outcome.upper_side);
                (
                    nan_max(low_side.p_value, high_side.p_value),
                    nan_min(low_side.z, high_side.z),
                    interval.lower > lower && interval.upper < upper,
                )
            }
        };

        let report = AnalysisReport {
            method: self.method,
            hypothesis: self.hypothesis,
            margin,
            alpha: self.alpha,
            p1: obs.p1,
            p2: obs.p2,
            diff,
            ci_lower: interval.lower,
            ci_upper: interval.upper,
            p_value,
            test_statistic,
            success,
            converged: outcome.converged,
        };
        debug!(
            "{} {}: diff={diff:.6} ci=[{:.6}, {:.6}] z={test_statistic:.4} p={p_value:.6} success={success}",
            self.method, self.hypothesis, report.ci_lower, report.ci_upper
        );
        Ok(report)
    }

    fn wald(&self, obs: &ObservedRates, null: &NullBoundary, z_critical: f64) -> MethodOutcome {
        let variance = wald_variance(obs, self.config.epsilon);
        let diff = obs.difference();
        MethodOutcome {
            interval: wald_interval(obs, z_critical, self.config.epsilon),
            lower_side: score_statistic(diff, null.lower(), variance),
            upper_side: score_statistic(diff, null.upper(), variance),
            converged: true,
        }
    }

    fn score_method(
        &self,
        obs: &ObservedRates,
        null: &NullBoundary,
        z_critical: f64,
        strategy: RmleStrategy,
    ) -> MethodOutcome {
        let lower_test = score_test(obs, null.lower(), strategy, &self.config);
        let upper_test = match null {
            NullBoundary::Single(_) => lower_test,
            NullBoundary::TwoOneSided { upper, .. } => {
                score_test(obs, *upper, strategy, &self.config)
            }
        };

        let interval = match strategy {
            RmleStrategy::Bisection => invert_score_test(obs, z_critical, &self.config),
            RmleStrategy::NewtonRaphson if z_critical.is_finite() => {
                // bounds use the restricted variance at the tested null on each side
                let diff = obs.difference();
                ConfidenceInterval::new(
                    diff - z_critical * lower_test.variance.sqrt(),
                    diff + z_critical * upper_test.variance.sqrt(),
                )
            }
            RmleStrategy::NewtonRaphson => ConfidenceInterval::undefined(),
        };

        MethodOutcome {
            interval,
            lower_side: lower_test.statistic,
            upper_side: upper_test.statistic,
            converged: lower_test.rmle.converged() && upper_test.rmle.converged(),
        }
    }

    fn wilson(&self, obs: &ObservedRates, null: &NullBoundary, z_critical: f64) -> MethodOutcome {
        let interval = newcombe_interval(obs, z_critical);
        let diff = obs.difference();
        // standard errors implied by each half of the hybrid interval; NaN without z_critical
        let lower_se = (diff - interval.lower) / z_critical;
        let upper_se = (interval.upper - diff) / z_critical;
        MethodOutcome {
            interval,
            lower_side: score_statistic(diff, null.lower(), lower_se * lower_se),
            upper_side: score_statistic(diff, null.upper(), upper_se * upper_se),
            converged: true,
        }
    }
}

/// Run every method for one hypothesis, in `Method::ALL` order.
pub fn compare_methods(
    data: &TrialData,
    hypothesis: Hypothesis,
    margin: f64,
    alpha: f64,
) -> Result<Vec<AnalysisReport>> {
    Method::ALL
        .iter()
        .map(|method| {
            TrialAnalysis::new(*method, hypothesis)
                .margin(margin)
                .alpha(alpha)
                .analyze(data)
        })
        .collect()
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn method_selectors_round_trip() {
        for method in Method::ALL {
            assert_eq!(method.code().parse::<Method>().unwrap(), method);
        }
        assert_eq!("MN".parse::<Method>().unwrap(), Method::MiettinenNurminen);
        assert!(matches!(
            "probit".parse::<Method>(),
            Err(ScoreError::UnknownMethod(name)) if name == "probit"
        ));
    }

    #[test]
    fn hypothesis_names_parse() {
        assert_eq!(
            "non_inferiority".parse::<Hypothesis>().unwrap(),
            Hypothesis::NonInferiority
        );
        assert_eq!("TOST".parse::<Hypothesis>().unwrap(), Hypothesis::Equivalence);
        for hypothesis in Hypothesis::ALL {
            assert_eq!(hypothesis.to_string().parse::<Hypothesis>().unwrap(), hypothesis);
        }
        assert!("bioequivalence".parse::<Hypothesis>().is_err());
    }

    #[test]
    fn null_boundaries_follow_margin() {
        assert_eq!(
            Hypothesis::NonInferiority.null_boundary(0.1),
            NullBoundary::Single(-0.1)
        );
        assert_eq!(
            Hypothesis::Superiority.null_boundary(0.1),
            NullBoundary::Single(0.0)
        );
        assert_eq!(
            Hypothesis::Equivalence.null_boundary(0.15),
            NullBoundary::TwoOneSided {
                lower: -0.15,
                upper: 0.15
            }
        );
    }

    #[test]
    fn nan_aware_extremes() {
        assert!(nan_max(0.1, f64::NAN).is_nan());
        assert!(nan_min(f64::NAN, 0.1).is_nan());
        assert_eq!(nan_max(0.1, 0.2), 0.2);
        assert_eq!(nan_min(0.1, 0.2), 0.1);
    }
}
