//! Threshold evaluation and per-level alert throttling.

use crate::config::ThresholdConfig;
use crate::metrics::MetricsSnapshot;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::None => "none",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }

    pub fn is_alert(&self) -> bool {
        *self != AlertLevel::None
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a snapshot by its CPU, memory and disk percentages.
///
/// Critical is checked first and wins even when only one metric is critical.
/// Comparisons are strict: a value equal to a threshold does not reach it.
/// Network counters and process status never affect the level.
pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &ThresholdConfig) -> AlertLevel {
    let readings = [
        snapshot.cpu_percent(),
        snapshot.memory_percent(),
        snapshot.disk_percent(),
    ];

    if readings.iter().any(|&value| value > thresholds.critical) {
        AlertLevel::Critical
    } else if readings.iter().any(|&value| value > thresholds.warning) {
        AlertLevel::Warning
    } else {
        AlertLevel::None
    }
}

/// Per-level cool-down so the same level is not re-sent within `interval`.
///
/// Levels are tracked independently: a recent warning never delays a
/// critical alert. A level missing from the map has never alerted.
#[derive(Debug)]
pub struct AlertThrottle {
    interval: Duration,
    last_alert_time: HashMap<AlertLevel, DateTime<Utc>>,
}

impl AlertThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_alert_time: HashMap::new(),
        }
    }

    /// Decide whether an alert at `level` may go out at `now`, recording `now`
    /// when it may.
    pub fn should_alert(&mut self, level: AlertLevel, now: DateTime<Utc>) -> bool {
        if let Some(last_time) = self.last_alert_time.get(&level) {
            if now - *last_time < self.interval {
                return false;
            }
        }

        self.last_alert_time.insert(level, now);
        true
    }

    /// Time of the last permitted alert at `level`
    pub fn last_alert(&self, level: AlertLevel) -> Option<DateTime<Utc>> {
        self.last_alert_time.get(&level).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testing::snapshot_at;
    use chrono::TimeZone;

    const THRESHOLDS: ThresholdConfig = ThresholdConfig {
        warning: 85.0,
        critical: 95.0,
    };

    fn level(cpu: f64, memory: f64, disk: f64) -> AlertLevel {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        evaluate(&snapshot_at(t0, cpu, memory, disk), &THRESHOLDS)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn all_at_or_below_warning_is_none() {
        for &(c, m, d) in &[
            (0.0, 0.0, 0.0),
            (85.0, 85.0, 85.0),
            (50.0, 84.9, 12.5),
            (85.0, 0.0, 42.0),
        ] {
            assert_eq!(level(c, m, d), AlertLevel::None, "({c}, {m}, {d})");
        }
    }

    #[test]
    fn any_single_metric_above_critical_is_critical() {
        assert_eq!(level(96.0, 10.0, 10.0), AlertLevel::Critical);
        assert_eq!(level(10.0, 95.1, 10.0), AlertLevel::Critical);
        assert_eq!(level(10.0, 10.0, 100.0), AlertLevel::Critical);
    }

    #[test]
    fn critical_wins_over_warning() {
        assert_eq!(level(96.0, 90.0, 90.0), AlertLevel::Critical);
        assert_eq!(level(90.0, 90.0, 99.0), AlertLevel::Critical);
    }

    #[test]
    fn max_between_warning_and_critical_is_warning() {
        assert_eq!(level(85.1, 10.0, 10.0), AlertLevel::Warning);
        assert_eq!(level(10.0, 90.0, 10.0), AlertLevel::Warning);
        assert_eq!(level(10.0, 10.0, 95.0), AlertLevel::Warning);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(level(85.0, 10.0, 10.0), AlertLevel::None);
        assert_eq!(level(95.0, 10.0, 10.0), AlertLevel::Warning);
    }

    #[test]
    fn network_and_processes_do_not_raise_level() {
        let mut snapshot = snapshot_at(t0(), 10.0, 10.0, 10.0);
        snapshot.network = Some(crate::metrics::NetworkCounters {
            errin: u64::MAX,
            dropout: u64::MAX,
            ..Default::default()
        });
        snapshot.process_status.insert("sshd".to_string(), false);
        assert_eq!(evaluate(&snapshot, &THRESHOLDS), AlertLevel::None);
    }

    #[test]
    fn throttle_suppresses_within_interval() {
        let mut throttle = AlertThrottle::new(Duration::seconds(3600));
        let t0 = t0();

        assert!(throttle.should_alert(AlertLevel::Critical, t0));
        assert!(!throttle.should_alert(AlertLevel::Critical, t0 + Duration::seconds(1000)));
        assert!(throttle.should_alert(AlertLevel::Critical, t0 + Duration::seconds(3601)));
        assert_eq!(
            throttle.last_alert(AlertLevel::Critical),
            Some(t0 + Duration::seconds(3601))
        );
    }

    #[test]
    fn throttle_permits_exactly_at_interval() {
        let mut throttle = AlertThrottle::new(Duration::seconds(3600));
        let t0 = t0();
        assert!(throttle.should_alert(AlertLevel::Warning, t0));
        assert!(throttle.should_alert(AlertLevel::Warning, t0 + Duration::seconds(3600)));
    }

    #[test]
    fn suppressed_request_keeps_previous_time() {
        let mut throttle = AlertThrottle::new(Duration::seconds(3600));
        let t0 = t0();
        throttle.should_alert(AlertLevel::Critical, t0);
        throttle.should_alert(AlertLevel::Critical, t0 + Duration::seconds(1000));
        assert_eq!(throttle.last_alert(AlertLevel::Critical), Some(t0));
    }

    #[test]
    fn levels_are_throttled_independently() {
        let mut throttle = AlertThrottle::new(Duration::seconds(3600));
        let t0 = t0();

        assert!(throttle.should_alert(AlertLevel::Critical, t0));
        assert!(throttle.should_alert(AlertLevel::Warning, t0 + Duration::seconds(10)));
        assert!(!throttle.should_alert(AlertLevel::Warning, t0 + Duration::seconds(20)));
        assert!(!throttle.should_alert(AlertLevel::Critical, t0 + Duration::seconds(20)));
        assert_eq!(throttle.last_alert(AlertLevel::None), None);
    }

    #[test]
    fn level_display_is_lowercase() {
        assert_eq!(AlertLevel::Critical.to_string(), "critical");
        assert_eq!(
            serde_json::to_string(&AlertLevel::Warning).unwrap(),
            "\"warning\""
        );
        assert!(!AlertLevel::None.is_alert());
    }
}
