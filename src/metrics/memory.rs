//! Memory metrics collection from /proc/meminfo.

use crate::error::CollectionError;
use serde::{Deserialize, Serialize};
use std::fs;

const PROC_MEMINFO: &str = "/proc/meminfo";

/// Memory reading carried in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReading {
    /// Total system RAM in bytes
    pub total: u64,
    /// Available memory in bytes
    pub available: u64,
    /// Used percentage, `(total - available) / total`
    pub percent: f64,
    /// Swap used percentage
    pub swap_percent: f64,
}

/// Memory metrics collector
#[derive(Debug, Default)]
pub struct MemoryCollector;

impl MemoryCollector {
    pub fn new() -> Self {
        Self
    }

    /// Collect current memory metrics
    pub fn collect(&mut self) -> Result<MemoryReading, CollectionError> {
        let meminfo = fs::read_to_string(PROC_MEMINFO)
            .map_err(|e| CollectionError::read(PROC_MEMINFO, e))?;
        parse_meminfo(&meminfo)
    }
}

pub(crate) fn parse_meminfo(meminfo: &str) -> Result<MemoryReading, CollectionError> {
    let mut total: u64 = 0;
    let mut free: u64 = 0;
    let mut available: Option<u64> = None;
    let mut buffers: u64 = 0;
    let mut cached: u64 = 0;
    let mut swap_total: u64 = 0;
    let mut swap_free: u64 = 0;

    for line in meminfo.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        let value: u64 = parts[1].parse().unwrap_or(0) * 1024; // Convert from KB to bytes

        match parts[0] {
            "MemTotal:" => total = value,
            "MemFree:" => free = value,
            "MemAvailable:" => available = Some(value),
            "Buffers:" => buffers = value,
            "Cached:" => cached = value,
            "SwapTotal:" => swap_total = value,
            "SwapFree:" => swap_free = value,
            _ => {}
        }
    }

    if total == 0 {
        return Err(CollectionError::parse(PROC_MEMINFO, "MemTotal missing or zero"));
    }

    // Kernels before 3.14 have no MemAvailable
    let available = available.unwrap_or(free + buffers + cached).min(total);
    let swap_used = swap_total.saturating_sub(swap_free);

    let percent = 100.0 * (total - available) as f64 / total as f64;
    let swap_percent = if swap_total > 0 {
        100.0 * swap_used as f64 / swap_total as f64
    } else {
        0.0
    };

    Ok(MemoryReading {
        total,
        available,
        percent,
        swap_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_uses_mem_available() {
        let meminfo = "MemTotal:       1000 kB\n\
                       MemFree:         100 kB\n\
                       MemAvailable:    250 kB\n\
                       Buffers:          10 kB\n\
                       Cached:           90 kB\n\
                       SwapTotal:       200 kB\n\
                       SwapFree:        150 kB\n";
        let reading = parse_meminfo(meminfo).unwrap();
        assert_eq!(reading.total, 1000 * 1024);
        assert_eq!(reading.available, 250 * 1024);
        assert!((reading.percent - 75.0).abs() < 1e-9);
        assert!((reading.swap_percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_without_mem_available() {
        let meminfo = "MemTotal: 1000 kB\nMemFree: 300 kB\nBuffers: 100 kB\nCached: 100 kB\n";
        let reading = parse_meminfo(meminfo).unwrap();
        assert!((reading.percent - 50.0).abs() < 1e-9);
        assert_eq!(reading.swap_percent, 0.0);
    }

    #[test]
    fn zero_total_is_rejected() {
        assert!(parse_meminfo("MemFree: 10 kB\n").is_err());
    }
}
