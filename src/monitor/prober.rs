//! Periodic HTTP probing of a single endpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::config::EndpointConfig;
use super::MonitorError;

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered. Any status class counts as a response.
    Response { status: u16 },
    /// The request failed at the transport layer or timed out.
    Failed { reason: String },
}

/// One observation of an endpoint, emitted once per tick.
#[derive(Debug, Clone)]
pub struct ProbeEvent {
    pub url: String,
    /// Wall time at probe start.
    pub at: DateTime<Utc>,
    pub outcome: ProbeOutcome,
    /// Probe start to response headers or failure.
    pub elapsed: Duration,
}

impl ProbeEvent {
    /// Status code of the response, or `None` for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self.outcome {
            ProbeOutcome::Response { status } => Some(status),
            ProbeOutcome::Failed { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Failed { .. })
    }
}

/// Issues one GET per check interval against a single URL and feeds
/// the shared probe channel.
///
/// The client disables keep-alive so every probe exercises a fresh
/// connection, and times out after one check interval so a stalled
/// server cannot skip ticks. The running flag is read by the loop task
/// and written by the orchestrator, hence atomic.
#[derive(Debug)]
pub struct Prober {
    url: String,
    interval: Duration,
    running: AtomicBool,
    client: reqwest::Client,
    out: mpsc::Sender<ProbeEvent>,
}

impl Prober {
    pub fn new(out: mpsc::Sender<ProbeEvent>, endpoint: &EndpointConfig) -> Result<Self, MonitorError> {
        let interval = endpoint.interval();
        let client = reqwest::Client::builder()
            .timeout(interval)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self {
            url: endpoint.url.clone(),
            interval,
            running: AtomicBool::new(false),
            client,
            out,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Mark the loop as live. The orchestrator sets this before
    /// spawning [`Prober::run`] so a start is observable immediately.
    pub(crate) fn mark_running(&self) {
        self.running.store(true, Ordering::Release);
    }

    /// Ask the loop to stop. Soft: a probe already in flight completes
    /// and its event is still delivered before the loop exits.
    pub(crate) fn pause(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// The probe loop. Runs until paused or the consumer goes away.
    pub(crate) async fn run(self: Arc<Self>) {
        let first = tokio::time::Instant::now() + self.interval;
        let mut tick = tokio::time::interval_at(first, self.interval);
        while self.is_running() {
            tick.tick().await;
            let event = self.probe_once().await;
            if self.out.send(event).await.is_err() {
                tracing::debug!(url = %self.url, "probe channel closed, stopping prober");
                self.pause();
            }
        }
    }

    async fn probe_once(&self) -> ProbeEvent {
        let at = Utc::now();
        let started = Instant::now();
        let outcome = match self.client.get(&self.url).send().await {
            Ok(response) => ProbeOutcome::Response {
                status: response.status().as_u16(),
            },
            Err(err) => ProbeOutcome::Failed {
                reason: err.to_string(),
            },
        };
        ProbeEvent {
            url: self.url.clone(),
            at,
            outcome,
            elapsed: started.elapsed(),
        }
    }
}
