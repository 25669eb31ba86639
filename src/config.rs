//! Monitor configuration loaded once at startup from a TOML file.

use crate::error::ConfigError;
use crate::logging::{LogRotation, DEFAULT_LOG_BACKUPS, DEFAULT_MAX_LOG_BYTES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete, validated monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Polling interval in seconds
    pub interval: u64,
    /// Processes expected to be running (reported, never escalated)
    pub critical_processes: Vec<String>,
    /// Optional log file, written alongside stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Size at which `log_file` is rolled over
    #[serde(default = "default_log_max_bytes")]
    pub log_max_bytes: u64,
    /// Rolled-over log files kept as `<log_file>.1` .. `<log_file>.N`
    #[serde(default = "default_log_backups")]
    pub log_backups: usize,
    /// Delay in seconds after a failed iteration
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    pub alert: AlertConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

/// Alert re-send policy and level thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Minimum seconds between two alerts of the same level
    pub interval: u64,
    pub levels: ThresholdConfig,
}

/// Percentage thresholds shared by CPU, memory and disk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub warning: f64,
    pub critical: f64,
}

/// SMTP delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// RFC 5322 "From" mailbox, e.g. `System Monitor <monitor@host>`
    pub sender: String,
    pub receiver: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    /// Empty means no authentication
    pub username: String,
    pub password: String,
    #[serde(default = "default_starttls")]
    pub starttls: bool,
}

/// In-memory history bound and persistence cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    #[serde(default = "default_save_every")]
    pub save_every: u64,
    #[serde(default = "default_history_dir")]
    pub dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            save_every: default_save_every(),
            dir: default_history_dir(),
        }
    }
}

/// Collector tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
    /// Window between the two /proc/stat reads of the first sample
    #[serde(default = "default_cpu_sample_ms")]
    pub cpu_sample_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            disk_mount: default_disk_mount(),
            cpu_sample_ms: default_cpu_sample_ms(),
        }
    }
}

fn default_retry_delay() -> u64 {
    60
}

fn default_log_max_bytes() -> u64 {
    DEFAULT_MAX_LOG_BYTES
}

fn default_log_backups() -> usize {
    DEFAULT_LOG_BACKUPS
}

fn default_starttls() -> bool {
    true
}

fn default_history_capacity() -> usize {
    1000
}

fn default_save_every() -> u64 {
    100
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_disk_mount() -> String {
    "/".to_string()
}

fn default_cpu_sample_ms() -> u64 {
    1000
}

fn alert_interval_delta(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

impl MonitorConfig {
    /// Read, parse and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == 0 {
            return Err(ConfigError::Invalid("interval must be at least 1 second".into()));
        }
        if self.alert.interval == 0 {
            return Err(ConfigError::Invalid(
                "alert.interval must be at least 1 second".into(),
            ));
        }
        if alert_interval_delta(self.alert.interval).is_none() {
            return Err(ConfigError::Invalid(format!(
                "alert.interval of {} seconds is out of range",
                self.alert.interval
            )));
        }
        if self.retry_delay == 0 {
            return Err(ConfigError::Invalid("retry_delay must be at least 1 second".into()));
        }

        let ThresholdConfig { warning, critical } = self.alert.levels;
        for (name, value) in [("warning", warning), ("critical", critical)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "alert.levels.{name} must be a percentage in [0, 100], got {value}"
                )));
            }
        }
        if warning >= critical {
            return Err(ConfigError::Invalid(format!(
                "alert.levels.warning ({warning}) must be below alert.levels.critical ({critical})"
            )));
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::Invalid("history.capacity must be positive".into()));
        }
        if self.history.save_every == 0 {
            return Err(ConfigError::Invalid("history.save_every must be positive".into()));
        }
        if self.log_max_bytes == 0 {
            return Err(ConfigError::Invalid("log_max_bytes must be positive".into()));
        }
        if self.collector.cpu_sample_ms == 0 {
            return Err(ConfigError::Invalid(
                "collector.cpu_sample_ms must be at least 1".into(),
            ));
        }
        if self.email.smtp_server.trim().is_empty() {
            return Err(ConfigError::Invalid("email.smtp_server must not be empty".into()));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }

    /// Saturates for values `validate` rejects.
    pub fn alert_interval(&self) -> chrono::Duration {
        alert_interval_delta(self.alert.interval).unwrap_or(chrono::Duration::MAX)
    }

    pub fn log_rotation(&self) -> LogRotation {
        LogRotation {
            max_bytes: self.log_max_bytes,
            backups: self.log_backups,
        }
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.alert.levels
    }
}

impl std::str::FromStr for MonitorConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: MonitorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CONFIG: &str = r#"
interval = 300
critical_processes = ["sshd", "postfix"]

[alert]
interval = 3600

[alert.levels]
warning = 85
critical = 95

[email]
sender = "System Monitor <monitor@monitor.localhost>"
receiver = "ops@example.com"
smtp_server = "localhost"
smtp_port = 25
username = ""
password = ""
"#;
