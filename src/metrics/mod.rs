//! Metrics collection for host resource snapshots.

pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;

pub use cpu::{CpuCollector, CpuReading};
pub use disk::{DiskCollector, DiskReading};
pub use memory::{MemoryCollector, MemoryReading};
pub use network::{NetworkCollector, NetworkCounters};

use crate::config::CollectorConfig;
use crate::error::CollectionError;
use crate::process;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Point-in-time reading of host resources. Never mutated after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuReading,
    pub memory: MemoryReading,
    pub disk: DiskReading,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkCounters>,
    pub process_status: BTreeMap<String, bool>,
}

impl MetricsSnapshot {
    pub fn cpu_percent(&self) -> f64 {
        self.cpu.percent
    }

    pub fn memory_percent(&self) -> f64 {
        self.memory.percent
    }

    pub fn disk_percent(&self) -> f64 {
        self.disk.percent
    }
}

/// Source of snapshots. Implementations bound their own latency.
pub trait Collector: Send + 'static {
    fn sample(&mut self) -> Result<MetricsSnapshot, CollectionError>;

    /// Best-effort; a name missing from the result counts as not running.
    fn process_status(&mut self, names: &[String]) -> BTreeMap<String, bool>;
}

/// Collector backed by /proc and statvfs.
pub struct SystemCollector {
    cpu: CpuCollector,
    memory: MemoryCollector,
    disk: DiskCollector,
    network: NetworkCollector,
    critical_processes: Vec<String>,
}

impl SystemCollector {
    pub fn new(config: &CollectorConfig, critical_processes: &[String]) -> Self {
        Self {
            cpu: CpuCollector::new(Duration::from_millis(config.cpu_sample_ms)),
            memory: MemoryCollector::new(),
            disk: DiskCollector::new(config.disk_mount.clone()),
            network: NetworkCollector::new(),
            critical_processes: critical_processes.to_vec(),
        }
    }
}

impl Collector for SystemCollector {
    fn sample(&mut self) -> Result<MetricsSnapshot, CollectionError> {
        let cpu = self.cpu.collect()?;
        let memory = self.memory.collect()?;
        let disk = self.disk.collect()?;

        let network = match self.network.collect() {
            Ok(counters) => Some(counters),
            Err(e) => {
                tracing::warn!(error = %e, "network counters unavailable");
                None
            }
        };

        let names = self.critical_processes.clone();
        let process_status = self.process_status(&names);

        Ok(MetricsSnapshot {
            timestamp: Utc::now(),
            cpu,
            memory,
            disk,
            network,
            process_status,
        })
    }

    fn process_status(&mut self, names: &[String]) -> BTreeMap<String, bool> {
        process::process_status(names)
    }
}
