//! Pull-model snapshots of an endpoint's windowed metrics.

use crate::config::EndpointConfig;
use super::aggregator::Aggregator;

/// Visual emphasis for a rendered summary cell. The presentation layer
/// maps tones to theme colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Emphasis,
    /// The value crossed its reporting threshold.
    Bad,
}

/// One formatted cell of a summary row.
#[derive(Debug, Clone)]
pub struct SummaryCell {
    pub text: String,
    pub tone: Tone,
}

impl SummaryCell {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Derived metrics for one window, refreshed on demand.
///
/// Negative sentinels mark metrics that have never been pulled; they
/// render as "collecting...", as do NaN ratios from an empty window.
#[derive(Debug, Clone)]
pub struct Measures {
    pub period: &'static str,
    pub availability: f64,
    pub avg_response_ms: f64,
    pub max_response_ms: f64,
    pub share_2xx: f64,
    pub share_3xx: f64,
    pub share_4xx: f64,
    pub share_5xx: f64,
    /// Transport failures over all probes in the window.
    pub unsuccessful_rate: f64,
}

impl Measures {
    fn collecting(period: &'static str) -> Self {
        Self {
            period,
            availability: -1.0,
            avg_response_ms: -1.0,
            max_response_ms: -1.0,
            share_2xx: -1.0,
            share_3xx: -1.0,
            share_4xx: -1.0,
            share_5xx: -1.0,
            unsuccessful_rate: -1.0,
        }
    }

    /// Pull the current derived metrics from an aggregator.
    pub fn update(&mut self, aggregator: &Aggregator) {
        self.availability = aggregator.availability();
        self.avg_response_ms = aggregator.avg_response_ms();
        self.max_response_ms = aggregator.max_response_ms();
        self.share_2xx = aggregator.class_share(2);
        self.share_3xx = aggregator.class_share(3);
        self.share_4xx = aggregator.class_share(4);
        self.share_5xx = aggregator.class_share(5);
        let errors = aggregator.error_count() as f64;
        self.unsuccessful_rate = errors / (errors + aggregator.count() as f64);
    }
}

/// Snapshot view of one endpoint for the presentation layer.
#[derive(Debug, Clone)]
pub struct Report {
    pub url: String,
    pub check_interval_ms: u64,
    /// Whether the endpoint's prober is currently running.
    pub active: bool,
    pub short: Measures,
    pub medium: Measures,
    pub long: Measures,
}

impl Report {
    pub fn new(endpoint: &EndpointConfig) -> Self {
        Self {
            url: endpoint.url.clone(),
            check_interval_ms: endpoint.check_interval_ms,
            active: false,
            short: Measures::collecting("Past 2 min"),
            medium: Measures::collecting("Past 10 min"),
            long: Measures::collecting("Past 1 hour"),
        }
    }

    /// Two table rows: the medium window, then the long window. The
    /// first cell of each row carries endpoint metadata.
    pub fn summary(&self) -> [Vec<SummaryCell>; 2] {
        let mut header = self.url.clone();
        if !self.active {
            header.push_str(" (sleeping)");
        }
        [
            measure_row(SummaryCell::new(header, Tone::Emphasis), &self.medium),
            measure_row(
                SummaryCell::new(format!("check interval: {} ms", self.check_interval_ms), Tone::Normal),
                &self.long,
            ),
        ]
    }
}

fn measure_row(lead: SummaryCell, measures: &Measures) -> Vec<SummaryCell> {
    vec![
        lead,
        SummaryCell::new(measures.period, Tone::Emphasis),
        format_ms(measures.avg_response_ms, 100.0),
        format_ms(measures.max_response_ms, 800.0),
        format_share(measures.availability, 0.8, 1.0),
        format_share(measures.share_2xx, 0.8, 1.0),
        format_share(measures.share_5xx, 0.0, 0.05),
        format_share(measures.share_4xx, 0.0, 0.05),
        format_share(measures.unsuccessful_rate, 0.0, 0.05),
    ]
}

/// Render a ratio as a floored percentage, flagged outside [low, high].
fn format_share(value: f64, low: f64, high: f64) -> SummaryCell {
    if value.is_nan() || value < 0.0 {
        return SummaryCell::new("collecting...", Tone::Normal);
    }
    let tone = if value < low || value > high {
        Tone::Bad
    } else {
        Tone::Normal
    };
    SummaryCell::new(format!("{} %", (value * 100.0).floor()), tone)
}

/// Render milliseconds to two decimals, flagged above `high`.
fn format_ms(value: f64, high: f64) -> SummaryCell {
    if value.is_nan() || value < 0.0 {
        return SummaryCell::new("collecting...", Tone::Normal);
    }
    let tone = if value > high { Tone::Bad } else { Tone::Normal };
    SummaryCell::new(format!("{} ms", (value * 100.0).floor() / 100.0), tone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::prober::{ProbeEvent, ProbeOutcome};
    use crate::monitor::SHORT_WINDOW;
    use chrono::Utc;
    use std::time::Duration;

    fn sample_endpoint() -> EndpointConfig {
        EndpointConfig::new("http://example.com", 500)
    }

    #[test]
    fn fresh_report_renders_collecting_placeholders() {
        let report = Report::new(&sample_endpoint());
        let [medium, long] = report.summary();

        assert!(medium[0].text.contains("(sleeping)"));
        assert_eq!(long[0].text, "check interval: 500 ms");
        for cell in medium.iter().skip(2).chain(long.iter().skip(2)) {
            assert_eq!(cell.text, "collecting...");
            assert_eq!(cell.tone, Tone::Normal);
        }
    }

    #[test]
    fn active_report_drops_the_sleeping_tag() {
        let mut report = Report::new(&sample_endpoint());
        report.active = true;
        let [medium, _] = report.summary();
        assert_eq!(medium[0].text, "http://example.com");
    }

    #[test]
    fn measures_update_pulls_from_the_aggregator() {
        let mut aggregator = Aggregator::new("http://example.com", SHORT_WINDOW);
        let base = Utc::now();
        for (status, elapsed_ms) in [(200u16, 40u64), (200, 60), (503, 120)] {
            aggregator.add(ProbeEvent {
                url: "http://example.com".to_string(),
                at: base,
                outcome: ProbeOutcome::Response { status },
                elapsed: Duration::from_millis(elapsed_ms),
            });
        }

        let mut report = Report::new(&sample_endpoint());
        report.medium.update(&aggregator);

        assert!((report.medium.availability - 2.0 / 3.0).abs() < 1e-9);
        assert!((report.medium.avg_response_ms - 220.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.medium.max_response_ms, 120.0);
        assert_eq!(report.medium.unsuccessful_rate, 0.0);
        assert!((report.medium.share_5xx - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_band_values_are_flagged() {
        let cell = format_share(0.5, 0.8, 1.0);
        assert_eq!(cell.text, "50 %");
        assert_eq!(cell.tone, Tone::Bad);

        let cell = format_share(0.1, 0.0, 0.05);
        assert_eq!(cell.tone, Tone::Bad);

        let cell = format_ms(950.0, 800.0);
        assert_eq!(cell.text, "950 ms");
        assert_eq!(cell.tone, Tone::Bad);

        let cell = format_ms(60.5, 100.0);
        assert_eq!(cell.text, "60.5 ms");
        assert_eq!(cell.tone, Tone::Normal);
    }

    #[test]
    fn shares_floor_to_whole_percent() {
        let cell = format_share(2.0 / 3.0, 0.0, 1.0);
        assert_eq!(cell.text, "66 %");
    }
}
