//! Alert payloads emitted by the monitoring pipeline.

use chrono::{DateTime, Utc};

/// Why an alert was raised. Drives presentation styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Short-window availability dropped to the alert floor.
    Down,
    /// Short-window availability climbed back above the floor.
    Recovered,
    /// A registry lifecycle event (register, start, pause, unregister).
    Lifecycle,
}

/// A message for the operator, delivered on the alert channel.
#[derive(Debug, Clone)]
pub struct Alert {
    /// Endpoint the alert concerns.
    pub url: String,
    /// When the alert was raised. For availability alerts this is the
    /// timestamp of the probe that tipped the window.
    pub at: DateTime<Utc>,
    /// Availability at emission; 0.0 for lifecycle messages.
    pub value: f64,
    /// Human-readable description.
    pub message: String,
    pub kind: AlertKind,
}

impl Alert {
    pub(crate) fn lifecycle(url: &str, message: String) -> Self {
        Self {
            url: url.to_string(),
            at: Utc::now(),
            value: 0.0,
            message,
            kind: AlertKind::Lifecycle,
        }
    }
}
