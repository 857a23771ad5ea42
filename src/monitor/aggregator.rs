//! Sliding-window statistics and availability alerting per endpoint.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use super::alert::{Alert, AlertKind};
use super::prober::{ProbeEvent, ProbeOutcome};
use super::window::Window;
use super::{LONG_WINDOW, MEDIUM_WINDOW, SHORT_WINDOW};

/// Availability at or below this fraction raises a down alert; climbing
/// strictly above it clears the alert again. Using the same threshold
/// for both edges (with one strict comparison) prevents flapping at the
/// boundary.
const AVAILABILITY_FLOOR: f64 = 0.80;

/// Windowed statistics for one endpoint over one duration.
///
/// [`Aggregator::add`] is the sole mutator; every reader derives its
/// answer from counters maintained incrementally on add and expiry, so
/// reads are O(1) (max response time is one heap lookup).
#[derive(Debug)]
pub struct Aggregator {
    url: String,
    window: Window,
    /// Successful probes currently in the window.
    count: u64,
    /// Transport failures currently in the window.
    error_count: u64,
    /// Sum of whole elapsed milliseconds across successful probes.
    sum_response_ms: i64,
    status_counts: HashMap<u16, u64>,
    /// Counts per status class, indexed by the leading digit.
    class_counts: [u64; 10],
    alert_active: bool,
}

impl Aggregator {
    pub fn new(url: &str, duration: Duration) -> Self {
        Self {
            url: url.to_string(),
            window: Window::new(duration),
            count: 0,
            error_count: 0,
            sum_response_ms: 0,
            status_counts: HashMap::new(),
            class_counts: [0; 10],
            alert_active: false,
        }
    }

    /// Fold one probe event into the window.
    ///
    /// Appends the event, expires samples that aged out, and evaluates
    /// the alert hysteresis. At most one alert is returned per call.
    pub fn add(&mut self, event: ProbeEvent) -> Option<Alert> {
        self.apply(&event);
        self.window.push(event);
        while let Some(expired) = self.window.pop_expired() {
            self.unapply(&expired);
        }
        self.evaluate_alert()
    }

    fn apply(&mut self, event: &ProbeEvent) {
        match event.outcome {
            ProbeOutcome::Response { status } => {
                self.count += 1;
                self.sum_response_ms += event.elapsed.as_millis() as i64;
                *self.status_counts.entry(status).or_insert(0) += 1;
                self.class_counts[usize::from(status / 100).min(9)] += 1;
            }
            ProbeOutcome::Failed { .. } => self.error_count += 1,
        }
    }

    fn unapply(&mut self, event: &ProbeEvent) {
        match event.outcome {
            ProbeOutcome::Response { status } => {
                self.count -= 1;
                self.sum_response_ms -= event.elapsed.as_millis() as i64;
                if let Some(n) = self.status_counts.get_mut(&status) {
                    *n -= 1;
                    if *n == 0 {
                        self.status_counts.remove(&status);
                    }
                }
                self.class_counts[usize::from(status / 100).min(9)] -= 1;
            }
            ProbeOutcome::Failed { .. } => self.error_count -= 1,
        }
    }

    fn evaluate_alert(&mut self) -> Option<Alert> {
        let availability = self.availability();
        let at = self.window.newest_at().unwrap_or_else(Utc::now);
        if availability <= AVAILABILITY_FLOOR && !self.alert_active {
            self.alert_active = true;
            Some(Alert {
                url: self.url.clone(),
                at,
                value: availability,
                kind: AlertKind::Down,
                message: format!(
                    "{} is down! availability {:.0}% at {}",
                    self.url,
                    availability * 100.0,
                    at.format("%Y-%m-%d %H:%M:%S"),
                ),
            })
        } else if availability > AVAILABILITY_FLOOR && self.alert_active {
            self.alert_active = false;
            Some(Alert {
                url: self.url.clone(),
                at,
                value: availability,
                kind: AlertKind::Recovered,
                message: format!(
                    "{} is up again! availability {:.0}% at {}",
                    self.url,
                    availability * 100.0,
                    at.format("%Y-%m-%d %H:%M:%S"),
                ),
            })
        } else {
            None
        }
    }

    /// Fraction of probes in the window that returned status 200, over
    /// all probes including transport failures. NaN while empty.
    pub fn availability(&self) -> f64 {
        self.status_count(200) as f64 / (self.count + self.error_count) as f64
    }

    /// Mean elapsed milliseconds across successful probes. NaN while
    /// the window holds no successes.
    pub fn avg_response_ms(&self) -> f64 {
        self.sum_response_ms as f64 / self.count as f64
    }

    /// Largest elapsed time in the window, in whole milliseconds. NaN
    /// while empty.
    pub fn max_response_ms(&self) -> f64 {
        self.window
            .max_elapsed()
            .map_or(f64::NAN, |elapsed| elapsed.as_millis() as f64)
    }

    /// Probes in the window that returned exactly `status`.
    pub fn status_count(&self, status: u16) -> u64 {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    /// Share of successful probes whose status class matches `digit`
    /// (2 for 2xx, and so on). NaN while the window holds no successes.
    pub fn class_share(&self, digit: u16) -> f64 {
        self.class_counts[usize::from(digit).min(9)] as f64 / self.count as f64
    }

    /// Successful probes currently in the window.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Transport failures currently in the window.
    pub fn error_count(&self) -> u64 {
        self.error_count
    }
}

/// The three sliding windows maintained for one endpoint.
///
/// Every probe event feeds all three; only the short window's alert is
/// surfaced, the longer windows exist for reporting.
#[derive(Debug)]
pub struct AggregatorSet {
    pub short: Mutex<Aggregator>,
    pub medium: Mutex<Aggregator>,
    pub long: Mutex<Aggregator>,
}

impl AggregatorSet {
    pub fn new(url: &str) -> Self {
        Self {
            short: Mutex::new(Aggregator::new(url, SHORT_WINDOW)),
            medium: Mutex::new(Aggregator::new(url, MEDIUM_WINDOW)),
            long: Mutex::new(Aggregator::new(url, LONG_WINDOW)),
        }
    }

    /// Feed one event to all three windows.
    pub fn observe(&self, event: ProbeEvent) -> Option<Alert> {
        let alert = self.short.lock().add(event.clone());
        self.medium.lock().add(event.clone());
        self.long.lock().add(event);
        alert
    }
}
