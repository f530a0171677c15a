//! Process-wide logging setup on top of `log4rs`.

use crate::config::LogConfig;
use crate::errors::{DriverError, Result};
use crate::utils::devlog;
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

/// Initializes logging from `log4rs.yaml` in the working directory.
pub fn init() -> std::result::Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file("log4rs.yaml", log4rs::config::Deserializers::default())?;
    Ok(())
}

/// Initializes logging from a specific YAML config file.
pub fn init_path(path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)
        .map_err(|e| DriverError::Config(e.to_string()))?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))
        .map_err(DriverError::from)
}

/// Builds the log4rs configuration: `driver.log` for everything, plus
/// `dev6.log` for operation traces when `dev_trace` is set.
pub fn build_config(cfg: &LogConfig) -> Result<Config> {
    let base = cfg.dir.clone().unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(cfg.retention).unwrap_or(u32::MAX);
    let level = parse_level(&cfg.level);

    let mut builder = Config::builder().appender(Appender::builder().build("driver", Box::new(rolling(&base, "driver", keep)?)));
    builder = if cfg.dev_trace {
        builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(&base, "dev6", keep)?)))
            .logger(Logger::builder().appender("dev6").additive(false).build(devlog::TARGET, LevelFilter::Trace))
    } else {
        builder.logger(Logger::builder().additive(false).build(devlog::TARGET, LevelFilter::Off))
    };
    builder
        .build(Root::builder().appender("driver").build(level))
        .map_err(|e| DriverError::Config(e.to_string()))
}

/// Installs the logger for the process. Fails if a logger is already installed.
pub fn configure(cfg: &LogConfig) -> Result<log4rs::Handle> {
    let config = build_config(cfg)?;
    log4rs::init_config(config).map_err(|e| DriverError::Config(e.to_string()))
}

/// Installs the logger using `LogConfig` defaults overridden by:
/// - NEXUSDRIVER_LOG_DIR
/// - NEXUSDRIVER_LOG_LEVEL
/// - NEXUSDRIVER_LOG_RETENTION
/// - NEXUSDRIVER_DEV6
pub fn configure_from_env() -> Result<log4rs::Handle> {
    let mut cfg = LogConfig::default();
    if let Ok(dir) = std::env::var("NEXUSDRIVER_LOG_DIR") {
        cfg.dir = Some(PathBuf::from(dir));
    }
    if let Ok(level) = std::env::var("NEXUSDRIVER_LOG_LEVEL") {
        cfg.level = level;
    }
    if let Some(n) = std::env::var("NEXUSDRIVER_LOG_RETENTION").ok().and_then(|s| s.parse().ok()) {
        cfg.retention = n;
    }
    cfg.dev_trace = std::env::var("NEXUSDRIVER_DEV6")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure(&cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("nonsense"), LevelFilter::Info);
        assert_eq!(parse_level("off"), LevelFilter::Off);
    }

    #[test]
    fn builds_config_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LogConfig { dir: Some(dir.path().join("logs")), dev_trace: true, ..LogConfig::default() };
        let config = build_config(&cfg).unwrap();
        assert_eq!(config.appenders().len(), 2);
        assert!(dir.path().join("logs").is_dir());
    }
}
