//! Wall-clock sliding window over probe events.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::heap::{MaxHeap, SampleId};
use super::prober::ProbeEvent;

#[derive(Debug)]
struct Sample {
    id: SampleId,
    event: ProbeEvent,
}

/// Probe events ordered oldest to newest, bounded by duration.
///
/// A sample expires once it is strictly older than the window duration
/// relative to the newest sample. The paired max-heap is kept in sync
/// so the largest elapsed time is always one lookup away and expiry
/// stays O(log n) per dropped sample.
#[derive(Debug)]
pub(crate) struct Window {
    duration: TimeDelta,
    samples: VecDeque<Sample>,
    heap: MaxHeap,
    next_id: SampleId,
}

impl Window {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration: TimeDelta::milliseconds(duration.as_millis() as i64),
            samples: VecDeque::new(),
            heap: MaxHeap::new(),
            next_id: 0,
        }
    }

    /// Append an event at the newest end.
    pub fn push(&mut self, event: ProbeEvent) {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.insert(id, event.elapsed);
        self.samples.push_back(Sample { id, event });
    }

    /// Drop the oldest sample if it has aged out of the window,
    /// returning its event so the caller can roll back counters.
    pub fn pop_expired(&mut self) -> Option<ProbeEvent> {
        let newest = self.samples.back()?.event.at;
        let oldest = self.samples.front()?;
        if oldest.event.at + self.duration < newest {
            let sample = self.samples.pop_front()?;
            self.heap.remove(sample.id);
            Some(sample.event)
        } else {
            None
        }
    }

    /// Largest elapsed time among the samples in the window.
    pub fn max_elapsed(&self) -> Option<Duration> {
        self.heap.max()
    }

    /// Timestamp of the newest sample.
    pub fn newest_at(&self) -> Option<DateTime<Utc>> {
        self.samples.back().map(|sample| sample.event.at)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::prober::ProbeOutcome;
    use chrono::TimeZone;

    fn event(at: DateTime<Utc>, elapsed_ms: u64) -> ProbeEvent {
        ProbeEvent {
            url: "http://example.com".to_string(),
            at,
            outcome: ProbeOutcome::Response { status: 200 },
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(secs as i64)
    }

    #[test]
    fn samples_age_out_strictly_past_the_duration() {
        let mut window = Window::new(Duration::from_secs(120));

        window.push(event(at(0), 50));
        window.push(event(at(119), 60));
        assert!(window.pop_expired().is_none());
        assert_eq!(window.len(), 2);

        window.push(event(at(121), 70));
        let expired = window.pop_expired().expect("t=0 sample should expire");
        assert_eq!(expired.at, at(0));
        assert!(window.pop_expired().is_none());
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn sample_exactly_at_the_boundary_is_kept() {
        let mut window = Window::new(Duration::from_secs(120));
        window.push(event(at(0), 50));
        window.push(event(at(120), 60));
        assert!(window.pop_expired().is_none());
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn max_elapsed_follows_expiry() {
        let mut window = Window::new(Duration::from_secs(120));
        window.push(event(at(0), 80));
        window.push(event(at(60), 50));
        assert_eq!(window.max_elapsed(), Some(Duration::from_millis(80)));

        window.push(event(at(121), 40));
        while window.pop_expired().is_some() {}
        assert_eq!(window.max_elapsed(), Some(Duration::from_millis(50)));
    }
}
