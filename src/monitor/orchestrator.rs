//! Endpoint registry and lifecycle coordination.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::EndpointConfig;
use super::aggregator::AggregatorSet;
use super::alert::Alert;
use super::prober::{ProbeEvent, Prober};
use super::report::{Report, SummaryCell};
use super::MonitorError;

/// Everything tracked for one registered URL.
struct Endpoint {
    prober: Arc<Prober>,
    aggregators: Arc<AggregatorSet>,
    report: Report,
}

/// Coordinates probing, aggregation and reporting for all endpoints.
///
/// Construction spawns a dispatcher task that drains the probe channel
/// for as long as the channel lives. Lifecycle operations arrive from
/// the presentation layer concurrently with the dispatcher's event
/// ingestion, so the registry sits behind a mutex; per-window state is
/// locked separately inside each [`AggregatorSet`].
///
/// Alerts are delivered best-effort with `try_send`: a stalled consumer
/// costs messages, never monitoring progress.
pub struct Orchestrator {
    registry: Mutex<HashMap<String, Endpoint>>,
    probe_tx: mpsc::Sender<ProbeEvent>,
    alert_tx: mpsc::Sender<Alert>,
    runtime: tokio::runtime::Handle,
}

impl Orchestrator {
    /// Build the orchestrator around externally owned channels and
    /// spawn its dispatcher. Must be called from within a tokio
    /// runtime; prober loops are spawned onto the same runtime.
    pub fn new(
        probe_tx: mpsc::Sender<ProbeEvent>,
        mut probe_rx: mpsc::Receiver<ProbeEvent>,
        alert_tx: mpsc::Sender<Alert>,
    ) -> Arc<Self> {
        let orchestrator = Arc::new(Self {
            registry: Mutex::new(HashMap::new()),
            probe_tx,
            alert_tx,
            runtime: tokio::runtime::Handle::current(),
        });

        let dispatcher = Arc::clone(&orchestrator);
        orchestrator.runtime.spawn(async move {
            while let Some(event) = probe_rx.recv().await {
                if let Err(err) = dispatcher.ingest(event) {
                    tracing::error!(%err, "dropping probe event");
                }
            }
        });

        orchestrator
    }

    /// Add an endpoint to the registry, paused. Fails if the URL is
    /// already registered.
    pub fn register(&self, endpoint: &EndpointConfig) -> Result<(), MonitorError> {
        let mut registry = self.registry.lock();
        if registry.contains_key(&endpoint.url) {
            self.emit(Alert::lifecycle(
                &endpoint.url,
                format!("{} is already registered for monitoring, aborting", endpoint.url),
            ));
            return Err(MonitorError::AlreadyRegistered(endpoint.url.clone()));
        }

        let prober = Arc::new(Prober::new(self.probe_tx.clone(), endpoint)?);
        registry.insert(
            endpoint.url.clone(),
            Endpoint {
                prober,
                aggregators: Arc::new(AggregatorSet::new(&endpoint.url)),
                report: Report::new(endpoint),
            },
        );
        self.emit(Alert::lifecycle(
            &endpoint.url,
            format!("{} is registered for monitoring", endpoint.url),
        ));
        Ok(())
    }

    /// Remove an endpoint. Fails if it is unknown or still running.
    pub fn unregister(&self, url: &str) -> Result<(), MonitorError> {
        let mut registry = self.registry.lock();
        let Some(endpoint) = registry.get(url) else {
            self.emit(Alert::lifecycle(url, format!("{url} is not registered, aborting")));
            return Err(MonitorError::NotRegistered(url.to_string()));
        };
        if endpoint.prober.is_running() {
            self.emit(Alert::lifecycle(url, format!("{url} is still running, aborting")));
            return Err(MonitorError::StillRunning(url.to_string()));
        }

        registry.remove(url);
        self.emit(Alert::lifecycle(url, format!("{url} is unregistered")));
        Ok(())
    }

    /// Start or resume probing. Returns `Ok(false)` when the endpoint
    /// was already running.
    pub fn start(&self, url: &str) -> Result<bool, MonitorError> {
        let mut registry = self.registry.lock();
        let endpoint = registry
            .get_mut(url)
            .ok_or_else(|| MonitorError::NotRegistered(url.to_string()))?;
        if endpoint.prober.is_running() {
            return Ok(false);
        }

        endpoint.report.active = true;
        endpoint.prober.mark_running();
        self.runtime.spawn(Arc::clone(&endpoint.prober).run());
        self.emit(Alert::lifecycle(url, format!("{url} monitoring has started")));
        Ok(true)
    }

    /// Signal the prober to stop. Soft: an in-flight probe still
    /// delivers its event. Returns `Ok(false)` when already paused.
    pub fn pause(&self, url: &str) -> Result<bool, MonitorError> {
        let mut registry = self.registry.lock();
        let endpoint = registry
            .get_mut(url)
            .ok_or_else(|| MonitorError::NotRegistered(url.to_string()))?;
        if !endpoint.prober.is_running() {
            return Ok(false);
        }

        endpoint.report.active = false;
        endpoint.prober.pause();
        self.emit(Alert::lifecycle(url, format!("{url} monitoring is paused")));
        Ok(true)
    }

    /// Whether the endpoint's prober is currently running.
    pub fn is_active(&self, url: &str) -> Result<bool, MonitorError> {
        let registry = self.registry.lock();
        registry
            .get(url)
            .map(|endpoint| endpoint.prober.is_running())
            .ok_or_else(|| MonitorError::NotRegistered(url.to_string()))
    }

    /// Registered URLs in sorted order.
    pub fn urls(&self) -> Vec<String> {
        let registry = self.registry.lock();
        let mut urls: Vec<String> = registry.keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Start every registered endpoint, stopping at the first error.
    pub fn start_all(&self) -> Result<(), MonitorError> {
        for url in self.urls() {
            self.start(&url)?;
        }
        Ok(())
    }

    /// Pause every registered endpoint, stopping at the first error.
    pub fn pause_all(&self) -> Result<(), MonitorError> {
        for url in self.urls() {
            self.pause(&url)?;
        }
        Ok(())
    }

    /// Unregister every endpoint, stopping at the first error.
    pub fn unregister_all(&self) -> Result<(), MonitorError> {
        for url in self.urls() {
            self.unregister(&url)?;
        }
        Ok(())
    }

    /// Refresh the medium-window measures from the live aggregator.
    pub fn update_medium_report(&self, url: &str) -> Result<(), MonitorError> {
        self.update_report(url, |endpoint| {
            let aggregator = endpoint.aggregators.medium.lock();
            endpoint.report.medium.update(&aggregator);
        })
    }

    /// Refresh the long-window measures from the live aggregator.
    pub fn update_long_report(&self, url: &str) -> Result<(), MonitorError> {
        self.update_report(url, |endpoint| {
            let aggregator = endpoint.aggregators.long.lock();
            endpoint.report.long.update(&aggregator);
        })
    }

    /// Refresh the short-window measures from the live aggregator.
    pub fn update_short_report(&self, url: &str) -> Result<(), MonitorError> {
        self.update_report(url, |endpoint| {
            let aggregator = endpoint.aggregators.short.lock();
            endpoint.report.short.update(&aggregator);
        })
    }

    fn update_report(
        &self,
        url: &str,
        refresh: impl FnOnce(&mut Endpoint),
    ) -> Result<(), MonitorError> {
        let mut registry = self.registry.lock();
        let endpoint = registry
            .get_mut(url)
            .ok_or_else(|| MonitorError::NotRegistered(url.to_string()))?;
        refresh(endpoint);
        Ok(())
    }

    /// Pre-formatted summary rows (medium and long window) for `url`.
    pub fn summary(&self, url: &str) -> Result<[Vec<SummaryCell>; 2], MonitorError> {
        let registry = self.registry.lock();
        registry
            .get(url)
            .map(|endpoint| endpoint.report.summary())
            .ok_or_else(|| MonitorError::NotRegistered(url.to_string()))
    }

    /// Route one probe event into its endpoint's windows and forward
    /// any short-window alert. Called only by the dispatcher; an
    /// unknown URL here means an event outlived its registration.
    fn ingest(&self, event: ProbeEvent) -> Result<(), MonitorError> {
        let aggregators = {
            let registry = self.registry.lock();
            registry
                .get(&event.url)
                .map(|endpoint| Arc::clone(&endpoint.aggregators))
                .ok_or_else(|| MonitorError::NoAggregator(event.url.clone()))?
        };
        if let Some(alert) = aggregators.observe(event) {
            self.emit(alert);
        }
        Ok(())
    }

    fn emit(&self, alert: Alert) {
        if let Err(err) = self.alert_tx.try_send(alert) {
            tracing::warn!(%err, "alert channel full, dropping alert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::prober::ProbeOutcome;
    use crate::monitor::{AlertKind, Tone};
    use chrono::Utc;
    use std::time::Duration;

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        alerts: mpsc::Receiver<Alert>,
    }

    fn harness() -> Harness {
        let (probe_tx, probe_rx) = mpsc::channel(1);
        let (alert_tx, alerts) = mpsc::channel(64);
        Harness {
            orchestrator: Orchestrator::new(probe_tx, probe_rx, alert_tx),
            alerts,
        }
    }

    fn endpoint() -> EndpointConfig {
        EndpointConfig::new("http://endpoint.test", 100)
    }

    fn drain(alerts: &mut mpsc::Receiver<Alert>) -> Vec<Alert> {
        let mut drained = Vec::new();
        while let Ok(alert) = alerts.try_recv() {
            drained.push(alert);
        }
        drained
    }

    #[tokio::test]
    async fn register_is_idempotent_rejecting() {
        let mut h = harness();
        let endpoint = endpoint();

        h.orchestrator.register(&endpoint).unwrap();
        let err = h.orchestrator.register(&endpoint).unwrap_err();
        assert!(matches!(err, MonitorError::AlreadyRegistered(_)));

        let alerts = drain(&mut h.alerts);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.kind == AlertKind::Lifecycle));
        assert!(alerts[1].message.contains("already registered"));
    }

    #[tokio::test]
    async fn unregister_requires_a_paused_prober() {
        let h = harness();
        let endpoint = endpoint();

        h.orchestrator.register(&endpoint).unwrap();
        assert!(h.orchestrator.start(&endpoint.url).unwrap());

        let err = h.orchestrator.unregister(&endpoint.url).unwrap_err();
        assert!(matches!(err, MonitorError::StillRunning(_)));

        assert!(h.orchestrator.pause(&endpoint.url).unwrap());
        h.orchestrator.unregister(&endpoint.url).unwrap();
        assert!(h.orchestrator.urls().is_empty());

        let err = h.orchestrator.unregister(&endpoint.url).unwrap_err();
        assert!(matches!(err, MonitorError::NotRegistered(_)));
    }

    #[tokio::test]
    async fn start_then_pause_round_trips_the_flags() {
        let h = harness();
        let endpoint = endpoint();
        h.orchestrator.register(&endpoint).unwrap();

        assert!(h.orchestrator.start(&endpoint.url).unwrap());
        assert!(h.orchestrator.is_active(&endpoint.url).unwrap());
        // a second start is a no-op
        assert!(!h.orchestrator.start(&endpoint.url).unwrap());

        assert!(h.orchestrator.pause(&endpoint.url).unwrap());
        assert!(!h.orchestrator.is_active(&endpoint.url).unwrap());
        assert!(!h.orchestrator.pause(&endpoint.url).unwrap());

        let [medium, _] = h.orchestrator.summary(&endpoint.url).unwrap();
        assert!(medium[0].text.contains("(sleeping)"));
    }

    #[tokio::test]
    async fn lifecycle_operations_on_unknown_urls_fail() {
        let h = harness();
        assert!(matches!(
            h.orchestrator.start("http://ghost.test"),
            Err(MonitorError::NotRegistered(_))
        ));
        assert!(matches!(
            h.orchestrator.pause("http://ghost.test"),
            Err(MonitorError::NotRegistered(_))
        ));
        assert!(matches!(
            h.orchestrator.summary("http://ghost.test"),
            Err(MonitorError::NotRegistered(_))
        ));
    }

    #[tokio::test]
    async fn ingest_rejects_events_for_unregistered_urls() {
        let h = harness();
        let event = ProbeEvent {
            url: "http://ghost.test".to_string(),
            at: Utc::now(),
            outcome: ProbeOutcome::Response { status: 200 },
            elapsed: Duration::from_millis(10),
        };
        let err = h.orchestrator.ingest(event).unwrap_err();
        assert!(matches!(err, MonitorError::NoAggregator(_)));
    }

    #[tokio::test]
    async fn ingested_events_reach_the_reports() {
        let mut h = harness();
        let endpoint = endpoint();
        h.orchestrator.register(&endpoint).unwrap();
        drain(&mut h.alerts);

        let base = Utc::now();
        for status in [200u16, 200, 200, 200, 200] {
            h.orchestrator
                .ingest(ProbeEvent {
                    url: endpoint.url.clone(),
                    at: base,
                    outcome: ProbeOutcome::Response { status },
                    elapsed: Duration::from_millis(40),
                })
                .unwrap();
        }

        h.orchestrator.update_medium_report(&endpoint.url).unwrap();
        let [medium, long] = h.orchestrator.summary(&endpoint.url).unwrap();
        assert_eq!(medium[4].text, "100 %");
        assert_eq!(medium[4].tone, Tone::Normal);
        // the long row has not been refreshed yet
        assert_eq!(long[4].text, "collecting...");
        // healthy traffic raises no alert
        assert!(drain(&mut h.alerts).is_empty());
    }

    #[tokio::test]
    async fn short_window_alerts_are_forwarded() {
        let mut h = harness();
        let endpoint = endpoint();
        h.orchestrator.register(&endpoint).unwrap();
        drain(&mut h.alerts);

        h.orchestrator
            .ingest(ProbeEvent {
                url: endpoint.url.clone(),
                at: Utc::now(),
                outcome: ProbeOutcome::Failed {
                    reason: "connection refused".to_string(),
                },
                elapsed: Duration::from_millis(100),
            })
            .unwrap();

        let alerts = drain(&mut h.alerts);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Down);
        assert_eq!(alerts[0].url, endpoint.url);
    }

    #[tokio::test]
    async fn all_variants_cover_every_registered_url() {
        let mut h = harness();
        let first = EndpointConfig::new("http://one.test", 100);
        let second = EndpointConfig::new("http://two.test", 100);
        h.orchestrator.register(&first).unwrap();
        h.orchestrator.register(&second).unwrap();
        drain(&mut h.alerts);

        h.orchestrator.start_all().unwrap();
        assert!(h.orchestrator.is_active(&first.url).unwrap());
        assert!(h.orchestrator.is_active(&second.url).unwrap());

        h.orchestrator.pause_all().unwrap();
        h.orchestrator.unregister_all().unwrap();
        assert!(h.orchestrator.urls().is_empty());
    }
}
