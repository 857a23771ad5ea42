//! Application state shared by the render loop and key handlers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crate::monitor::{Alert, AlertKind, Orchestrator, SummaryCell};
use crate::ui::Theme;

/// Most recent alert messages kept for display.
const MESSAGE_CAP: usize = 8;

/// One line of the alert log.
#[derive(Debug, Clone)]
pub struct AlertLine {
    pub message: String,
    pub kind: AlertKind,
}

/// Main application state.
pub struct App {
    pub running: bool,
    orchestrator: Arc<Orchestrator>,
    /// Registered URLs in config order; drives the table layout.
    pub urls: Vec<String>,
    /// Rolling log of the most recent alerts, oldest first.
    pub messages: VecDeque<AlertLine>,
    pub theme: Theme,
    pub started_at: Instant,
}

impl App {
    pub fn new(orchestrator: Arc<Orchestrator>, urls: Vec<String>) -> Self {
        Self {
            running: true,
            orchestrator,
            urls,
            messages: VecDeque::new(),
            theme: Theme::dark(),
            started_at: Instant::now(),
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Resume monitoring for every endpoint.
    pub fn start_all(&mut self) {
        if let Err(err) = self.orchestrator.start_all() {
            tracing::error!(%err, "failed to resume monitoring");
        }
    }

    /// Pause monitoring for every endpoint.
    pub fn pause_all(&mut self) {
        if let Err(err) = self.orchestrator.pause_all() {
            tracing::error!(%err, "failed to pause monitoring");
        }
    }

    /// Append an alert to the rolling message log.
    pub fn push_alert(&mut self, alert: Alert) {
        tracing::info!(url = %alert.url, kind = ?alert.kind, "{}", alert.message);
        self.messages.push_back(AlertLine {
            message: alert.message,
            kind: alert.kind,
        });
        while self.messages.len() > MESSAGE_CAP {
            self.messages.pop_front();
        }
    }

    /// Refresh the medium-window reports for every endpoint.
    pub fn refresh_medium(&mut self) {
        for url in &self.urls {
            if let Err(err) = self.orchestrator.update_medium_report(url) {
                tracing::error!(%err, "failed to refresh medium report");
            }
        }
    }

    /// Refresh the long-window reports for every endpoint.
    pub fn refresh_long(&mut self) {
        for url in &self.urls {
            if let Err(err) = self.orchestrator.update_long_report(url) {
                tracing::error!(%err, "failed to refresh long report");
            }
        }
    }

    /// Summary rows for every endpoint, in config order.
    pub fn summaries(&self) -> Vec<Vec<SummaryCell>> {
        let mut rows = Vec::with_capacity(self.urls.len() * 2);
        for url in &self.urls {
            match self.orchestrator.summary(url) {
                Ok([medium, long]) => {
                    rows.push(medium);
                    rows.push(long);
                }
                Err(err) => tracing::error!(%err, "failed to build summary"),
            }
        }
        rows
    }
}
