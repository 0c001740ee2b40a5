//! Structured logging setup shared by the binary and the test harnesses.
//!
//! Library code only emits `tracing` events; this module installs the subscriber. It can
//! be initialised once per process, later calls are ignored.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

pub use imageprobe_core::config::LOG_LEVEL as LOG_LEVEL_VAR;
pub const LOG_JSON_VAR: &str = "IMAGEPROBE_LOG_JSON";

/// Crates whose events the level applies to.
const OWN_TARGETS: &[&str] = &["imageprobe_core", "imageprobe_cli", "imageprobe"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,

    /// JSON lines instead of the pretty console format.
    pub use_json: bool,

    pub include_target: bool,

    /// File and line of the event.
    pub include_location: bool,

    /// Useful when many trials run in parallel.
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Settings for the parallel test harnesses: warnings only unless asked otherwise,
    /// with thread ids so interleaved trials can be told apart.
    pub fn harness() -> Self {
        Self {
            level: Level::WARN,
            include_thread_ids: true,
            ..Default::default()
        }
    }
}

/// Parses a level name, falling back to INFO on anything unknown.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    OWN_TARGETS
        .iter()
        .filter_map(|target| format!("{}={}", target, level).parse::<Directive>().ok())
        .fold(EnvFilter::new("warn"), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Events go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids),
                )
                .init();
        }
    });
}

/// Reads `IMAGEPROBE_LOG_LEVEL` and `IMAGEPROBE_LOG_JSON` on top of `base`.
pub fn config_from_env(base: LoggingConfig) -> LoggingConfig {
    let level = env::var(LOG_LEVEL_VAR)
        .ok()
        .map(|v| parse_level(&v))
        .unwrap_or(base.level);

    let use_json = env::var(LOG_JSON_VAR)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(base.use_json);

    LoggingConfig {
        level,
        use_json,
        ..base
    }
}

pub fn init_from_env() {
    init_logging(config_from_env(LoggingConfig::default()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("Warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("loud"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_harness_config() {
        let config = LoggingConfig::harness();
        assert_eq!(config.level, Level::WARN);
        assert!(config.include_thread_ids);
        assert!(!config.use_json);
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides_base() {
        env::set_var(LOG_LEVEL_VAR, "debug");
        env::set_var(LOG_JSON_VAR, "true");

        let config = config_from_env(LoggingConfig::harness());
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
        assert!(config.include_thread_ids);

        env::remove_var(LOG_LEVEL_VAR);
        env::remove_var(LOG_JSON_VAR);
    }

    #[test]
    #[serial]
    fn test_config_from_env_keeps_base_when_unset() {
        env::remove_var(LOG_LEVEL_VAR);
        env::remove_var(LOG_JSON_VAR);

        let config = config_from_env(LoggingConfig::harness());
        assert_eq!(config.level, Level::WARN);
        assert!(!config.use_json);
    }
}
