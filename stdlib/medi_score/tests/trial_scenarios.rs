mod common;

use approx::assert_abs_diff_eq;
use medi_normal::NormalQuantile;
use medi_score::{
    compare_methods, lower_tail_p, score_test, upper_tail_p, Hypothesis, Method, RmleStrategy,
    ScoreConfig, ScoreError, TrialAnalysis, TrialData,
};
use pretty_assertions::assert_eq;

use common::{balanced_trial, init_test_logger, non_inferiority_trial};

#[test]
fn miettinen_nurminen_declares_non_inferiority() {
    init_test_logger();
    let report = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::NonInferiority)
        .margin(0.10)
        .alpha(0.025)
        .analyze(&non_inferiority_trial())
        .unwrap();

    assert_abs_diff_eq!(report.p1, 0.80, epsilon = 1e-12);
    assert_abs_diff_eq!(report.p2, 0.85, epsilon = 1e-12);
    assert_abs_diff_eq!(report.diff, 0.05, epsilon = 1e-12);
    assert!(report.test_statistic > 2.0, "z = {}", report.test_statistic);
    assert!(report.p_value < 0.025);
    assert!(report.ci_lower > -0.10);
    assert!(report.ci_lower < report.diff && report.diff < report.ci_upper);
    assert!(report.converged);
    assert!(report.is_non_inferior());
}

#[test]
fn balanced_arms_are_equivalent() {
    init_test_logger();
    let data = balanced_trial();

    let rmle = score_test(
        &data.observed(),
        0.0,
        RmleStrategy::Bisection,
        &ScoreConfig::default(),
    )
    .rmle;
    assert_abs_diff_eq!(rmle.p1, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(rmle.p2, 0.5, epsilon = 1e-12);

    let report = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::Equivalence)
        .margin(0.15)
        .alpha(0.10)
        .analyze(&data)
        .unwrap();
    assert!(report.success);
    assert!(report.ci_lower > -0.15 && report.ci_upper < 0.15);

    // both one-sided tests reject; the report carries the larger p-value
    let config = ScoreConfig::default();
    let above_lower = score_test(&data.observed(), -0.15, RmleStrategy::Bisection, &config);
    let below_upper = score_test(&data.observed(), 0.15, RmleStrategy::Bisection, &config);
    let p_lower = upper_tail_p(above_lower.z());
    let p_upper = lower_tail_p(below_upper.z());
    assert!(p_lower < 0.10 && p_upper < 0.10);
    assert_abs_diff_eq!(p_lower, p_upper, epsilon = 1e-9);
    assert_abs_diff_eq!(report.p_value, p_lower.max(p_upper), epsilon = 1e-15);
    // symmetric data gives a symmetric interval
    assert_abs_diff_eq!(report.ci_lower, -report.ci_upper, epsilon = 1e-6);
    assert!(!report.is_non_inferior());
}

#[test]
fn balanced_arms_are_underpowered_at_five_percent() {
    // 50 per arm cannot show equivalence within 0.15 once alpha drops to 0.05
    let data = balanced_trial();
    for alpha in [0.025, 0.05] {
        for report in compare_methods(&data, Hypothesis::Equivalence, 0.15, alpha).unwrap() {
            assert!(!report.success, "{} alpha={alpha}", report.method);
            assert!(report.p_value > 0.05, "{} alpha={alpha}", report.method);
        }
    }
}

#[test]
fn every_method_and_hypothesis_reports_a_sane_result() {
    init_test_logger();
    let data = non_inferiority_trial();
    for hypothesis in Hypothesis::ALL {
        for method in Method::ALL {
            let report = TrialAnalysis::new(method, hypothesis)
                .margin(0.10)
                .alpha(0.025)
                .analyze(&data)
                .unwrap();

            assert!(report.interval().is_defined(), "{method} {hypothesis}");
            assert!(
                report.ci_lower < report.diff && report.diff < report.ci_upper,
                "{method} {hypothesis}: [{}, {}]",
                report.ci_lower,
                report.ci_upper
            );
            assert!((0.0..=1.0).contains(&report.p_value), "{method} {hypothesis}");
            assert!(report.test_statistic.is_finite());
            assert_eq!(report.method, method);
            assert_eq!(report.hypothesis, hypothesis);

            let expected = hypothesis == Hypothesis::NonInferiority;
            assert_eq!(report.success, expected, "{method} {hypothesis}");
        }
    }
}

#[test]
fn every_method_finds_balanced_arms_equivalent() {
    let reports = compare_methods(&balanced_trial(), Hypothesis::Equivalence, 0.15, 0.10).unwrap();
    assert_eq!(reports.len(), 4);
    for (report, method) in reports.iter().zip(Method::ALL) {
        assert_eq!(report.method, method);
        assert!(report.success, "{method}");
    }
}

#[test]
fn wide_interval_fails_equivalence() {
    let report = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::Equivalence)
        .margin(0.10)
        .alpha(0.025)
        .analyze(&non_inferiority_trial())
        .unwrap();
    assert!(report.ci_upper > 0.10);
    assert!(!report.success);
    assert!(report.p_value > 0.025);
}

#[test]
fn margin_sign_is_ignored() {
    let data = non_inferiority_trial();
    let analysis = TrialAnalysis::new(Method::FarringtonManning, Hypothesis::NonInferiority);
    let positive = analysis.margin(0.10).analyze(&data).unwrap();
    let negative = analysis.margin(-0.10).analyze(&data).unwrap();
    assert_eq!(positive, negative);
    assert_eq!(negative.margin, 0.10);
}

#[test]
fn degenerate_alpha_leaves_interval_undefined() {
    let data = non_inferiority_trial();
    for alpha in [0.0, 1.0, -0.5] {
        for method in Method::ALL {
            let report = TrialAnalysis::new(method, Hypothesis::NonInferiority)
                .margin(0.10)
                .alpha(alpha)
                .analyze(&data)
                .unwrap();
            assert!(report.ci_lower.is_nan(), "{method} alpha={alpha}");
            assert!(report.ci_upper.is_nan(), "{method} alpha={alpha}");
            assert!(!report.success);
        }
    }
}

#[test]
fn degenerate_alpha_keeps_score_statistics() {
    let data = non_inferiority_trial();
    for method in Method::ALL {
        let report = TrialAnalysis::new(method, Hypothesis::NonInferiority)
            .margin(0.10)
            .alpha(0.0)
            .analyze(&data)
            .unwrap();
        if method == Method::WilsonNewcombe {
            assert!(report.p_value.is_nan() && report.test_statistic.is_nan());
        } else {
            assert!(report.p_value.is_finite(), "{method}");
            assert!(report.test_statistic > 2.0, "{method}");
        }
    }
}

#[test]
fn wilson_statistic_follows_alpha() {
    let data = non_inferiority_trial();
    let p_at = |alpha: f64| {
        TrialAnalysis::new(Method::WilsonNewcombe, Hypothesis::Superiority)
            .alpha(alpha)
            .analyze(&data)
            .unwrap()
            .p_value
    };
    assert!(p_at(0.025) != p_at(0.10));

    let mn_at = |alpha: f64| {
        TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::Superiority)
            .alpha(alpha)
            .analyze(&data)
            .unwrap()
            .p_value
    };
    assert_eq!(mn_at(0.025), mn_at(0.10));
}

#[test]
fn invalid_margins_are_rejected() {
    let data = non_inferiority_trial();
    let analysis = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::NonInferiority);

    assert!(matches!(
        analysis.margin(1.5).analyze(&data),
        Err(ScoreError::InvalidMargin(m)) if m == 1.5
    ));
    assert!(matches!(
        analysis.margin(f64::NAN).analyze(&data),
        Err(ScoreError::InvalidMargin(m)) if m.is_nan()
    ));
    assert!(matches!(
        analysis.margin(f64::INFINITY).analyze(&data),
        Err(ScoreError::InvalidMargin(_))
    ));
}

#[test]
fn invalid_counts_are_rejected() {
    assert!(matches!(
        TrialData::new(10, 11, 10, 5),
        Err(ScoreError::InvalidSample {
            successes: 11,
            trials: 10
        })
    ));
    assert!(matches!(
        TrialData::new(10, 5, 0, 0),
        Err(ScoreError::InvalidSample { trials: 0, .. })
    ));
}

#[test]
fn private_quantile_source_matches_global_cache() {
    let data = non_inferiority_trial();
    let analysis = TrialAnalysis::new(Method::WilsonNewcombe, Hypothesis::NonInferiority)
        .margin(0.10)
        .alpha(0.025);

    let mut quantiles = NormalQuantile::new(8);
    let private = analysis.analyze_with(&data, &mut quantiles).unwrap();
    let global = analysis.analyze(&data).unwrap();

    assert_eq!(private, global);
    assert_eq!(quantiles.cache().len(), 1);
}

#[test]
fn swapping_arms_mirrors_the_interval() {
    let data = non_inferiority_trial();
    let analysis = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::Superiority);
    let original = analysis.analyze(&data).unwrap();
    let mirrored = analysis.analyze(&data.swapped()).unwrap();

    assert_abs_diff_eq!(mirrored.diff, -original.diff, epsilon = 1e-12);
    assert_abs_diff_eq!(mirrored.ci_lower, -original.ci_upper, epsilon = 1e-6);
    assert_abs_diff_eq!(mirrored.ci_upper, -original.ci_lower, epsilon = 1e-6);
}

#[test]
fn score_methods_expose_their_strategy() {
    assert_eq!(
        Method::FarringtonManning.strategy(),
        Some(RmleStrategy::NewtonRaphson)
    );
    assert_eq!(
        Method::MiettinenNurminen.strategy(),
        Some(RmleStrategy::Bisection)
    );
    assert_eq!(Method::Wald.strategy(), None);
}

#[cfg(feature = "serde")]
#[test]
fn report_serializes_to_json() {
    let report = TrialAnalysis::new(Method::MiettinenNurminen, Hypothesis::NonInferiority)
        .margin(0.10)
        .analyze(&non_inferiority_trial())
        .unwrap();
    let json = report.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["method"], "miettinen-nurminen");
    assert_eq!(value["hypothesis"], "non-inferiority");
    assert_eq!(value["success"], true);
    for field in ["p1", "p2", "diff", "ci_lower", "ci_upper", "p_value", "test_statistic"] {
        assert!(value[field].is_number(), "{field}");
    }
}
