//! One-shot component check behind `--test`.

use crate::alert::{evaluate, AlertThrottle};
use crate::config::MonitorConfig;
use crate::history::{MetricsHistory, PersistenceStore};
use crate::metrics::Collector;
use crate::report::{alert_subject, format_alert_message};
use chrono::Utc;
use tracing::{error, info};

/// Exercise config, collector, evaluator, throttle, formatter and store once.
///
/// Returns true when every step succeeded. No alert is sent.
pub fn run_self_test<C, S>(config: &MonitorConfig, collector: &mut C, store: &mut S) -> bool
where
    C: Collector,
    S: PersistenceStore,
{
    info!("checking configuration");
    if let Err(e) = config.validate() {
        error!(error = %e, "configuration check failed");
        return false;
    }

    info!("sampling system metrics");
    let snapshot = match collector.sample() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "metrics collection failed");
            return false;
        }
    };
    info!(
        cpu = snapshot.cpu_percent(),
        memory = snapshot.memory_percent(),
        disk = snapshot.disk_percent(),
        network = snapshot.network.is_some(),
        "metrics collected"
    );

    info!("checking critical processes");
    let status = collector.process_status(&config.critical_processes);
    for name in &config.critical_processes {
        let running = status.get(name).copied().unwrap_or(false);
        info!(process = %name, running, "process status");
    }

    let level = evaluate(&snapshot, &config.thresholds());
    info!(level = %level, "alert level evaluated");

    let mut throttle = AlertThrottle::new(config.alert_interval());
    let now = Utc::now();
    if !throttle.should_alert(level, now) || throttle.should_alert(level, now) {
        error!("alert throttle did not suppress an immediate repeat");
        return false;
    }

    if level.is_alert() {
        let subject = alert_subject(level);
        let body = format_alert_message(&snapshot, level, &config.critical_processes);
        info!(subject = %subject, bytes = body.len(), "alert message formatted");
    }

    let mut history = MetricsHistory::new(config.history.capacity, config.history.save_every);
    history.push(snapshot);
    match store.save(history.entries()) {
        Ok(path) => info!(path = %path.display(), "history saved"),
        Err(e) => {
            error!(error = %e, "history save failed");
            return false;
        }
    }

    true
}
