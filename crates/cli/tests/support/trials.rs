use libtest_mimic::{Failed, Trial};

/// A trial that reports why the suite could not be set up at all.
#[allow(dead_code)]
pub fn setup_failure(suite: &str, message: String) -> Trial {
    Trial::test(format!("{}::setup", suite), move || Err(Failed::from(message)))
}

/// A placeholder listed as ignored when the suite is disabled in this environment, so the
/// run output says why nothing was executed.
#[allow(dead_code)]
pub fn disabled(suite: &str, reason: &str) -> Trial {
    let reason = reason.to_string();
    Trial::test(format!("{}::disabled", suite), move || {
        Err(Failed::from(reason))
    })
    .with_ignored_flag(true)
}
