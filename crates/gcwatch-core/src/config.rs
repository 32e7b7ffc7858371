//! YAML configuration for a monitoring session.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::alert::AlertCondition;
use crate::bins::BinSpec;

/// Monitoring session configuration.
///
/// ```yaml
/// gc_log: /var/log/app/gc.log
/// poll_interval_secs: 1
/// from_start: true
/// bins:
///   interval_secs: 30.0
/// alerts:
///   - "mem_free <= 1024M"
///   - "fgc.interval_sec < 60"
/// export:
///   dir: .
///   prefix: JvmGC
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// GC log file to tail.
    pub gc_log: PathBuf,
    /// Seconds between tail polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Read the log from the beginning instead of only new lines. GC
    /// analysis usually wants the full history, so this defaults to true.
    #[serde(default = "default_from_start")]
    pub from_start: bool,
    #[serde(default)]
    pub bins: BinConfig,
    /// Alert condition expressions, `<field> <op> <value>`.
    #[serde(default)]
    pub alerts: Vec<String>,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Time-bin specification: a fixed count or a fixed interval, not both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BinConfig {
    pub count: Option<usize>,
    pub interval_secs: Option<f64>,
}

/// Where exported tables are written.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_export_prefix")]
    pub prefix: String,
}

fn default_poll_interval() -> u64 {
    1
}

fn default_from_start() -> bool {
    true
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_export_prefix() -> String {
    "JvmGC".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            prefix: default_export_prefix(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            gc_log: PathBuf::from("gc.log"),
            poll_interval_secs: default_poll_interval(),
            from_start: default_from_start(),
            bins: BinConfig::default(),
            alerts: Vec::new(),
            export: ExportConfig::default(),
        }
    }
}

/// Error loading or validating a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

impl MonitorConfig {
    /// Loads and validates a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: MonitorConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates field combinations and alert expressions, so a bad config
    /// fails at startup rather than mid-session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.bins.count.is_some() && self.bins.interval_secs.is_some() {
            return Err(ConfigError::Invalid(
                "bins.count and bins.interval_secs are mutually exclusive".to_string(),
            ));
        }
        if self.bins.count == Some(0) {
            return Err(ConfigError::Invalid(
                "bins.count must be positive".to_string(),
            ));
        }
        if let Some(interval) = self.bins.interval_secs
            && interval <= 0.0
        {
            return Err(ConfigError::Invalid(
                "bins.interval_secs must be positive".to_string(),
            ));
        }
        for expr in &self.alerts {
            AlertCondition::parse(expr)
                .map_err(|e| ConfigError::Invalid(format!("alert '{}': {}", expr, e)))?;
        }
        Ok(())
    }

    /// The configured bin specification, if any.
    pub fn bin_spec(&self) -> Option<BinSpec> {
        match (self.bins.count, self.bins.interval_secs) {
            (Some(count), _) => Some(BinSpec::Count(count)),
            (None, Some(interval)) => Some(BinSpec::Interval(interval)),
            (None, None) => None,
        }
    }
}
