//! Network counters from /proc/net/dev.

use crate::error::CollectionError;
use serde::{Deserialize, Serialize};
use std::fs;

const PROC_NET_DEV: &str = "/proc/net/dev";

/// Cumulative counters since boot, summed over non-loopback interfaces.
///
/// Only used when formatting alert messages; never part of level evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
    pub dropin: u64,
    pub dropout: u64,
}

/// Network counter collector
#[derive(Debug, Default)]
pub struct NetworkCollector;

impl NetworkCollector {
    pub fn new() -> Self {
        Self
    }

    /// Collect current network counters
    pub fn collect(&mut self) -> Result<NetworkCounters, CollectionError> {
        let netdev = fs::read_to_string(PROC_NET_DEV)
            .map_err(|e| CollectionError::read(PROC_NET_DEV, e))?;
        Ok(parse_net_dev(&netdev))
    }
}

pub(crate) fn parse_net_dev(netdev: &str) -> NetworkCounters {
    let mut counters = NetworkCounters::default();

    for line in netdev.lines().skip(2) {
        // "eth0: 123 ..." and "eth0:123 ..." both occur
        let Some((interface, fields)) = line.split_once(':') else {
            continue;
        };
        if interface.trim() == "lo" {
            continue;
        }

        let parts: Vec<u64> = fields
            .split_whitespace()
            .map(|s| s.parse().unwrap_or(0))
            .collect();
        if parts.len() < 16 {
            continue;
        }

        counters.bytes_recv += parts[0];
        counters.packets_recv += parts[1];
        counters.errin += parts[2];
        counters.dropin += parts[3];
        counters.bytes_sent += parts[8];
        counters.packets_sent += parts[9];
        counters.errout += parts[10];
        counters.dropout += parts[11];
    }

    counters
}
