pub mod trials;

use imageprobe_cli::logging::{self, LoggingConfig};
use imageprobe_core::HarnessConfig;
use libtest_mimic::Failed;
use std::fmt::Display;
use std::path::PathBuf;

/// Installs the tracing subscriber once for the whole harness binary.
#[allow(dead_code)]
pub fn init_logging() {
    logging::init_logging(logging::config_from_env(LoggingConfig::harness()));
}

#[allow(dead_code)]
pub fn imageprobe_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_imageprobe"))
}

#[allow(dead_code)]
pub fn language_version_fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/language-versions")
}

/// Reads the harness configuration, turning errors into a message suitable for a
/// single failing trial.
#[allow(dead_code)]
pub fn load_config() -> Result<HarnessConfig, String> {
    HarnessConfig::from_env().map_err(|e| format!("Invalid harness configuration: {}", e))
}

#[allow(dead_code)]
pub fn failed<E: Display>(context: &str) -> impl FnOnce(E) -> Failed + '_ {
    move |e| Failed::from(format!("{}: {}", context, e))
}
