//! Host resource monitor with threshold alerts.
//!
//! Samples CPU, memory, disk and network usage on a fixed interval, maps each
//! sample to an alert level, and emails rate-limited notifications.

pub mod alert;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod process;
pub mod report;
pub mod scheduler;
pub mod selftest;
pub mod shutdown;

pub use alert::{evaluate, AlertLevel, AlertThrottle};
pub use config::{MonitorConfig, ThresholdConfig};
pub use history::{JsonHistoryStore, MetricsHistory, PersistenceStore};
pub use metrics::{Collector, MetricsSnapshot, SystemCollector};
pub use notify::{EmailNotifier, Notifier};
pub use scheduler::{CycleReport, Monitor, Notification};
