//! The monitoring pipeline.
//!
//! One [`Prober`] per endpoint emits [`ProbeEvent`]s onto a shared
//! channel. The [`Orchestrator`] owns the endpoint registry, drains the
//! channel from a dispatcher task, and feeds each event into the
//! endpoint's [`AggregatorSet`] - three sliding windows whose short
//! window drives availability alerting. [`Report`] offers pull-model
//! snapshots of the derived metrics for the presentation layer.

mod aggregator;
mod alert;
mod heap;
mod orchestrator;
mod prober;
mod report;
mod window;

pub use aggregator::{Aggregator, AggregatorSet};
pub use alert::{Alert, AlertKind};
pub use orchestrator::Orchestrator;
pub use prober::{ProbeEvent, ProbeOutcome, Prober};
pub use report::{Measures, Report, SummaryCell, Tone};

use std::time::Duration;

use thiserror::Error;

/// Sliding-window durations maintained for every endpoint.
pub const SHORT_WINDOW: Duration = Duration::from_secs(2 * 60);
pub const MEDIUM_WINDOW: Duration = Duration::from_secs(10 * 60);
pub const LONG_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Errors returned by orchestrator lifecycle operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The URL is already present in the registry.
    #[error("endpoint {0} is already registered")]
    AlreadyRegistered(String),

    /// The URL is not present in the registry.
    #[error("endpoint {0} is not registered")]
    NotRegistered(String),

    /// Unregistering requires the prober to be paused first.
    #[error("prober for {0} is still running")]
    StillRunning(String),

    /// A probe event arrived for a URL without aggregators. The
    /// dispatcher is the only caller, so this indicates a bug rather
    /// than an operator mistake.
    #[error("no aggregator for endpoint {0}")]
    NoAggregator(String),

    /// The probe HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
