//! Score tests and confidence intervals for two independent proportions.
//!
//! This crate validates comparative clinical-trial results on a risk
//! difference `p2 - p1`. Its core is a constrained-likelihood score engine:
//!
//! - [`rmle`] computes the restricted MLE of both rates under `p2 - p1 = delta`,
//!   by Newton-Raphson (Farrington-Manning) or bisection (Miettinen-Nurminen);
//! - [`variance`] and [`statistic`] turn that estimate into a z statistic;
//! - [`interval`] inverts the Miettinen-Nurminen test into a confidence interval;
//! - [`analysis`] dispatches over method × hypothesis and assembles reports.
//!
//! ```
//! use medi_score::{Hypothesis, Method, TrialAnalysis, TrialData};
//!
//! let data = TrialData::new(50, 25, 50, 25).unwrap();
//! let report = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::Equivalence)
//!     .margin(0.15)
//!     .alpha(0.10)
//!     .analyze(&data)
//!     .unwrap();
//! assert!(report.is_success());
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod interval;
pub mod rmle;
pub mod sample;
pub mod statistic;
pub mod variance;

pub use analysis::{
    compare_methods, AnalysisReport, Hypothesis, Method, NullBoundary, TrialAnalysis, TrialData,
};
pub use config::{BisectionConfig, InversionConfig, NewtonConfig, ScoreConfig};
pub use error::{Result, ScoreError};
pub use interval::{
    invert_score_test, newcombe_interval, wald_interval, wilson_interval, ConfidenceInterval,
};
pub use rmle::{
    constrained_information, constrained_score, FeasibleInterval, ObservedRates, RestrictedMle,
    RmleStrategy, Termination,
};
pub use sample::{clip_probability, pooled_rate, risk_difference, ProportionSample};
pub use statistic::{
    lower_tail_p, score_statistic, score_test, upper_tail_p, ScoreResult, ScoreTest,
};
pub use variance::{rmle_variance, small_sample_factor, wald_variance};
