//! The polling loop: sample, evaluate, throttle, notify, persist, sleep.

use crate::alert::{evaluate, AlertLevel, AlertThrottle};
use crate::config::{MonitorConfig, ThresholdConfig};
use crate::error::MonitorError;
use crate::history::{MetricsHistory, PersistenceStore};
use crate::metrics::{Collector, MetricsSnapshot};
use crate::notify::Notifier;
use crate::report::{alert_subject, format_alert_message};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What happened to the alert in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Level was `None`
    NotRequired,
    /// Same level alerted within the re-send interval
    Throttled,
    Sent,
    /// Delivery failed; still counts against the throttle
    Failed,
}

/// Outcome of a successful cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub level: AlertLevel,
    pub notification: Notification,
    /// History was persisted this cycle
    pub saved: bool,
}

/// Single-host monitor owning the throttle and history.
///
/// The collector runs on a blocking worker; everything else is mutated only
/// through `&mut self` from the one task driving [`Monitor::run`].
pub struct Monitor<C, N, S> {
    collector: Arc<Mutex<C>>,
    notifier: N,
    store: S,
    thresholds: ThresholdConfig,
    critical_processes: Vec<String>,
    throttle: AlertThrottle,
    history: MetricsHistory,
    interval: Duration,
    retry_delay: Duration,
}

impl<C, N, S> Monitor<C, N, S>
where
    C: Collector,
    N: Notifier,
    S: PersistenceStore,
{
    pub fn new(config: &MonitorConfig, collector: C, notifier: N, store: S) -> Self {
        Self {
            collector: Arc::new(Mutex::new(collector)),
            notifier,
            store,
            thresholds: config.thresholds(),
            critical_processes: config.critical_processes.clone(),
            throttle: AlertThrottle::new(config.alert_interval()),
            history: MetricsHistory::new(config.history.capacity, config.history.save_every),
            interval: config.poll_interval(),
            retry_delay: config.retry_delay(),
        }
    }

    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }

    pub fn throttle(&self) -> &AlertThrottle {
        &self.throttle
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run until `shutdown` resolves, then persist history once.
    ///
    /// Whatever iteration is in flight when `shutdown` fires is dropped, so no
    /// alert goes out after the signal.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            interval_secs = self.interval.as_secs(),
            warning = self.thresholds.warning,
            critical = self.thresholds.critical,
            "monitor started"
        );

        loop {
            let delay = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                delay = self.iterate() => delay,
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(entries = self.history.len(), "shutting down, saving history");
        self.flush();
    }

    /// One cycle at the current time, mapped to the delay before the next.
    async fn iterate(&mut self) -> Duration {
        match self.run_cycle_at(Utc::now()).await {
            Ok(_) => self.interval,
            Err(MonitorError::Collection(e)) => {
                warn!(error = %e, "failed to collect metrics, skipping cycle");
                self.interval
            }
            Err(e) => {
                error!(
                    error = %e,
                    retry_secs = self.retry_delay.as_secs(),
                    "monitor iteration failed"
                );
                self.retry_delay
            }
        }
    }

    /// Run one cycle, using `now` for throttling decisions.
    ///
    /// A collection failure returns before touching the throttle or history.
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> Result<CycleReport, MonitorError> {
        let snapshot = self.sample().await?;
        let level = evaluate(&snapshot, &self.thresholds);

        info!(
            cpu = format_args!("{:.1}%", snapshot.cpu_percent()),
            memory = format_args!("{:.1}%", snapshot.memory_percent()),
            disk = format_args!("{:.1}%", snapshot.disk_percent()),
            level = %level,
            "system metrics"
        );

        let notification = if level.is_alert() {
            self.maybe_notify(&snapshot, level, now).await
        } else {
            Notification::NotRequired
        };

        let timestamp = snapshot.timestamp;
        let saved = self.history.push(snapshot) && self.flush();

        Ok(CycleReport {
            timestamp,
            level,
            notification,
            saved,
        })
    }

    async fn sample(&self) -> Result<MetricsSnapshot, MonitorError> {
        let collector = Arc::clone(&self.collector);
        tokio::task::spawn_blocking(move || {
            // A panic in an earlier sample poisons the lock; the collector
            // state is still usable
            let mut collector = collector.lock().unwrap_or_else(PoisonError::into_inner);
            collector.sample()
        })
        .await
        .map_err(|e| MonitorError::Worker(e.to_string()))?
        .map_err(MonitorError::from)
    }

    async fn maybe_notify(
        &mut self,
        snapshot: &MetricsSnapshot,
        level: AlertLevel,
        now: DateTime<Utc>,
    ) -> Notification {
        if !self.throttle.should_alert(level, now) {
            debug!(level = %level, "alert suppressed by throttle");
            return Notification::Throttled;
        }

        let subject = alert_subject(level);
        let body = format_alert_message(snapshot, level, &self.critical_processes);

        match self.notifier.send(&subject, &body, level).await {
            Ok(()) => Notification::Sent,
            Err(e) => {
                error!(
                    error = %e,
                    level = %level,
                    cpu = snapshot.cpu_percent(),
                    memory = snapshot.memory_percent(),
                    disk = snapshot.disk_percent(),
                    timestamp = %snapshot.timestamp,
                    "failed to send alert"
                );
                Notification::Failed
            }
        }
    }

    /// Persist the current history. Failures are logged and the in-memory
    /// copy is kept for the next attempt.
    pub fn flush(&mut self) -> bool {
        match self.store.save(self.history.entries()) {
            Ok(path) => {
                debug!(path = %path.display(), entries = self.history.len(), "history saved");
                true
            }
            Err(e) => {
                error!(error = %e, entries = self.history.len(), "failed to save history");
                false
            }
        }
    }
}
