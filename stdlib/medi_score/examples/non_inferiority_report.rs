use medi_score::{compare_methods, Hypothesis, TrialData};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // reference 80/100, treatment 85/100, margin 10 points
    let data = TrialData::new(100, 80, 100, 85)?;
    for hypothesis in [Hypothesis::NonInferiority, Hypothesis::Equivalence] {
        println!("{hypothesis} (margin 0.10, alpha 0.025)");
        for report in compare_methods(&data, hypothesis, 0.10, 0.025)? {
            println!(
                "  {:<7} diff={:+.4} ci=[{:+.4}, {:+.4}] z={:.3} p={:.4} success={}",
                report.method.to_string(),
                report.diff,
                report.ci_lower,
                report.ci_upper,
                report.test_statistic,
                report.p_value,
                report.success
            );
        }
    }

    let balanced = TrialData::new(50, 25, 50, 25)?;
    let reports = compare_methods(&balanced, Hypothesis::Equivalence, 0.15, 0.10)?;
    println!("{}", reports[0].to_json()?);
    Ok(())
}
