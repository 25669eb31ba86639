//! Human-readable alert subject and body.

use crate::alert::AlertLevel;
use crate::metrics::MetricsSnapshot;
use std::fmt;

const MIB: f64 = 1024.0 * 1024.0;

/// Format bytes to human readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn alert_subject(level: AlertLevel) -> String {
    format!("System resource alert - {}", level.as_str().to_uppercase())
}

/// Alert body embedding the snapshot.
///
/// Every name in `critical_processes` is listed; names the collector did not
/// report are shown as not running.
pub fn format_alert_message(
    snapshot: &MetricsSnapshot,
    level: AlertLevel,
    critical_processes: &[String],
) -> String {
    AlertMessage {
        snapshot,
        level,
        critical_processes,
    }
    .to_string()
}

/// Renders the alert body into any formatter.
pub struct AlertMessage<'a> {
    pub snapshot: &'a MetricsSnapshot,
    pub level: AlertLevel,
    pub critical_processes: &'a [String],
}

impl fmt::Display for AlertMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot;
        let cpu = &snapshot.cpu;
        let memory = &snapshot.memory;
        let disk = &snapshot.disk;

        writeln!(f, "System resource alert (level: {})", self.level.as_str().to_uppercase())?;
        writeln!(f, "Time: {}", snapshot.timestamp.to_rfc3339())?;
        writeln!(f)?;

        writeln!(f, "CPU:")?;
        writeln!(f, "- Usage: {:.1}%", cpu.percent)?;
        writeln!(f, "- Cores: {}", cpu.count)?;
        match cpu.freq_mhz {
            Some(freq) => writeln!(f, "- Frequency: {:.0} MHz", freq)?,
            None => writeln!(f, "- Frequency: N/A")?,
        }
        writeln!(
            f,
            "- Load average: {:.2} {:.2} {:.2}",
            cpu.load_avg.0, cpu.load_avg.1, cpu.load_avg.2
        )?;
        writeln!(f)?;

        writeln!(f, "Memory:")?;
        writeln!(f, "- Usage: {:.1}%", memory.percent)?;
        writeln!(f, "- Available: {}", format_bytes(memory.available))?;
        writeln!(f, "- Total: {}", format_bytes(memory.total))?;
        writeln!(f, "- Swap usage: {:.1}%", memory.swap_percent)?;
        writeln!(f)?;

        writeln!(f, "Disk ({}):", disk.mount)?;
        writeln!(f, "- Usage: {:.1}%", disk.percent)?;
        writeln!(f, "- Free: {}", format_bytes(disk.free))?;
        writeln!(f, "- Total: {}", format_bytes(disk.total))?;
        writeln!(f)?;

        writeln!(f, "Critical processes:")?;
        if self.critical_processes.is_empty() {
            writeln!(f, "- none configured")?;
        }
        for name in self.critical_processes {
            let running = snapshot.process_status.get(name).copied().unwrap_or(false);
            let state = if running { "running" } else { "NOT RUNNING" };
            writeln!(f, "- {}: {}", name, state)?;
        }

        if let Some(network) = &snapshot.network {
            writeln!(f)?;
            writeln!(f, "Network:")?;
            writeln!(f, "- Sent: {:.2} MB", network.bytes_sent as f64 / MIB)?;
            writeln!(f, "- Received: {:.2} MB", network.bytes_recv as f64 / MIB)?;
            writeln!(f, "- Errors (in/out): {}/{}", network.errin, network.errout)?;
            writeln!(f, "- Drops (in/out): {}/{}", network.dropin, network.dropout)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testing::snapshot_at;
    use crate::metrics::NetworkCounters;
    use chrono::{TimeZone, Utc};

    fn snapshot() -> MetricsSnapshot {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        snapshot_at(t0, 96.4, 40.0, 41.5)
    }

    #[test]
    fn formats_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn subject_names_the_level() {
        assert_eq!(alert_subject(AlertLevel::Critical), "System resource alert - CRITICAL");
    }

    #[test]
    fn body_embeds_snapshot_values() {
        let body = format_alert_message(&snapshot(), AlertLevel::Critical, &[]);
        assert!(body.contains("level: CRITICAL"));
        assert!(body.contains("2024-03-01T08:30:00+00:00"));
        assert!(body.contains("- Usage: 96.4%"));
        assert!(body.contains("- Frequency: 2400 MHz"));
        assert!(body.contains("- Total: 8.00 GB"));
        assert!(body.contains("Disk (/):"));
        assert!(body.contains("- none configured"));
        assert!(!body.contains("Network:"));
    }

    #[test]
    fn message_writes_into_existing_buffer() {
        use std::fmt::Write;

        let snapshot = snapshot();
        let names = vec!["sshd".to_string()];
        let mut buffer = String::from("> ");
        write!(
            buffer,
            "{}",
            AlertMessage {
                snapshot: &snapshot,
                level: AlertLevel::Critical,
                critical_processes: &names,
            }
        )
        .unwrap();

        let body = format_alert_message(&snapshot, AlertLevel::Critical, &names);
        assert_eq!(buffer, format!("> {body}"));
        let cpu = body.find("CPU:").unwrap();
        let memory = body.find("Memory:").unwrap();
        let processes = body.find("Critical processes:").unwrap();
        assert!(cpu < memory && memory < processes);
        assert!(body.ends_with("- sshd: NOT RUNNING\n"));
    }

    #[test]
    fn unreported_processes_are_not_running() {
        let mut snapshot = snapshot();
        snapshot.process_status.insert("sshd".to_string(), true);
        let names = vec!["sshd".to_string(), "postfix".to_string()];
        let body = format_alert_message(&snapshot, AlertLevel::Warning, &names);
        assert!(body.contains("- sshd: running"));
        assert!(body.contains("- postfix: NOT RUNNING"));
    }

    #[test]
    fn network_section_when_present() {
        let mut snapshot = snapshot();
        snapshot.network = Some(NetworkCounters {
            bytes_sent: 2 * 1024 * 1024,
            bytes_recv: 1024 * 1024,
            errin: 3,
            errout: 4,
            dropin: 5,
            dropout: 6,
            ..Default::default()
        });
        let body = format_alert_message(&snapshot, AlertLevel::Warning, &[]);
        assert!(body.contains("- Sent: 2.00 MB"));
        assert!(body.contains("- Received: 1.00 MB"));
        assert!(body.contains("- Errors (in/out): 3/4"));
        assert!(body.contains("- Drops (in/out): 5/6"));
    }
}
