//! CPU metrics collection from /proc/stat, /proc/loadavg and /proc/cpuinfo.

use crate::error::CollectionError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

const PROC_STAT: &str = "/proc/stat";
const PROC_LOADAVG: &str = "/proc/loadavg";
const PROC_CPUINFO: &str = "/proc/cpuinfo";

/// Raw CPU time values from /proc/stat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    pub fn idle_all(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// CPU reading carried in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    /// Overall utilization percentage
    pub percent: f64,
    /// Number of logical cores
    pub count: usize,
    /// Current frequency averaged over cores, if the kernel reports it
    pub freq_mhz: Option<f64>,
    /// Load averages (1min, 5min, 15min)
    pub load_avg: (f64, f64, f64),
}

/// CPU collector keeping the previous /proc/stat reading for deltas.
///
/// The first call has nothing to diff against, so it takes a second reading
/// after `window`.
pub struct CpuCollector {
    prev_times: Option<CpuTimes>,
    window: Duration,
}

impl CpuCollector {
    pub fn new(window: Duration) -> Self {
        Self {
            prev_times: None,
            window,
        }
    }

    /// Collect current CPU metrics
    pub fn collect(&mut self) -> Result<CpuReading, CollectionError> {
        let prev = match self.prev_times.take() {
            Some(prev) => prev,
            None => {
                let (first, _) = read_proc_stat()?;
                std::thread::sleep(self.window);
                first
            }
        };

        let (times, count) = read_proc_stat()?;
        let percent = calculate_utilization(&prev, &times);
        self.prev_times = Some(times);

        let load_avg = read_load_average()?;
        let freq_mhz = fs::read_to_string(PROC_CPUINFO)
            .ok()
            .and_then(|content| parse_cpu_mhz(&content));

        Ok(CpuReading {
            percent,
            count,
            freq_mhz,
            load_avg,
        })
    }
}

/// Aggregate times and number of per-core lines.
fn read_proc_stat() -> Result<(CpuTimes, usize), CollectionError> {
    let content =
        fs::read_to_string(PROC_STAT).map_err(|e| CollectionError::read(PROC_STAT, e))?;
    parse_proc_stat(&content)
}

pub(crate) fn parse_proc_stat(content: &str) -> Result<(CpuTimes, usize), CollectionError> {
    let mut total = None;
    let mut cores = 0;

    for line in content.lines() {
        if line.starts_with("cpu ") {
            total = Some(parse_cpu_line(line));
        } else if line.starts_with("cpu") {
            cores += 1;
        }
    }

    let total = total.ok_or_else(|| CollectionError::parse(PROC_STAT, "missing aggregate cpu line"))?;
    Ok((total, cores.max(1)))
}

fn parse_cpu_line(line: &str) -> CpuTimes {
    let parts: Vec<u64> = line
        .split_whitespace()
        .skip(1) // Skip "cpu"
        .filter_map(|s| s.parse().ok())
        .collect();

    CpuTimes {
        user: *parts.first().unwrap_or(&0),
        nice: *parts.get(1).unwrap_or(&0),
        system: *parts.get(2).unwrap_or(&0),
        idle: *parts.get(3).unwrap_or(&0),
        iowait: *parts.get(4).unwrap_or(&0),
        irq: *parts.get(5).unwrap_or(&0),
        softirq: *parts.get(6).unwrap_or(&0),
        steal: *parts.get(7).unwrap_or(&0),
    }
}

pub(crate) fn calculate_utilization(prev: &CpuTimes, curr: &CpuTimes) -> f64 {
    let total_delta = curr.total().saturating_sub(prev.total());
    if total_delta == 0 {
        return 0.0;
    }

    let idle_delta = curr.idle_all().saturating_sub(prev.idle_all());
    let busy = 100.0 * (1.0 - (idle_delta as f64 / total_delta as f64));
    busy.clamp(0.0, 100.0)
}

fn read_load_average() -> Result<(f64, f64, f64), CollectionError> {
    let content =
        fs::read_to_string(PROC_LOADAVG).map_err(|e| CollectionError::read(PROC_LOADAVG, e))?;

    let parts: Vec<f64> = content
        .split_whitespace()
        .take(3)
        .filter_map(|s| s.parse().ok())
        .collect();

    Ok((
        *parts.first().unwrap_or(&0.0),
        *parts.get(1).unwrap_or(&0.0),
        *parts.get(2).unwrap_or(&0.0),
    ))
}

/// Mean of the "cpu MHz" lines, `None` when the kernel does not expose them.
pub(crate) fn parse_cpu_mhz(content: &str) -> Option<f64> {
    let freqs: Vec<f64> = content
        .lines()
        .filter(|line| line.starts_with("cpu MHz"))
        .filter_map(|line| line.split(':').nth(1))
        .filter_map(|value| value.trim().parse().ok())
        .collect();

    if freqs.is_empty() {
        None
    } else {
        Some(freqs.iter().sum::<f64>() / freqs.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  100 0 50 800 50 0 0 0 0 0\n\
                        cpu0 50 0 25 400 25 0 0 0 0 0\n\
                        cpu1 50 0 25 400 25 0 0 0 0 0\n\
                        intr 12345\n\
                        ctxt 6789\n";

    #[test]
    fn parses_aggregate_line_and_core_count() {
        let (times, cores) = parse_proc_stat(STAT).unwrap();
        assert_eq!(cores, 2);
        assert_eq!(times.user, 100);
        assert_eq!(times.idle, 800);
        assert_eq!(times.total(), 1000);
    }

    #[test]
    fn missing_aggregate_line_is_a_parse_error() {
        let err = parse_proc_stat("intr 1\n").unwrap_err();
        assert!(matches!(err, CollectionError::Parse { .. }));
    }

    #[test]
    fn utilization_counts_iowait_as_idle() {
        let prev = CpuTimes {
            user: 100,
            idle: 800,
            iowait: 100,
            ..Default::default()
        };
        let curr = CpuTimes {
            user: 175,
            idle: 810,
            iowait: 115,
            ..Default::default()
        };
        // 100 ticks elapsed, 25 idle or waiting
        assert!((calculate_utilization(&prev, &curr) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn utilization_is_zero_without_elapsed_ticks() {
        let times = CpuTimes::default();
        assert_eq!(calculate_utilization(&times, &times), 0.0);
    }

    #[test]
    fn averages_cpu_mhz_lines() {
        let cpuinfo = "processor\t: 0\ncpu MHz\t\t: 2000.000\nprocessor\t: 1\ncpu MHz\t\t: 3000.000\n";
        assert_eq!(parse_cpu_mhz(cpuinfo), Some(2500.0));
        assert_eq!(parse_cpu_mhz("processor\t: 0\n"), None);
    }
}
