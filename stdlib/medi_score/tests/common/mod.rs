use std::sync::Once;

use medi_score::TrialData;

static INIT: Once = Once::new();

/// Route `log` output from the engine through the test harness.
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    });
}

/// 80/100 on reference vs 85/100 on treatment.
#[allow(dead_code)]
pub fn non_inferiority_trial() -> TrialData {
    TrialData::new(100, 80, 100, 85).unwrap()
}

/// 25/50 in both arms.
#[allow(dead_code)]
pub fn balanced_trial() -> TrialData {
    TrialData::new(50, 25, 50, 25).unwrap()
}
