use serde::Serialize;
use std::sync::Mutex;

/// Counters describing the feed polling activity.
pub struct MetricsRecorder {
    inner: Mutex<PollMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollMetrics {
    pub dispatched: usize,
    pub applied: usize,
    pub discarded: usize,
    pub errors: usize,
    pub malformed: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PollMetrics::default()),
        }
    }

    fn update(&self, f: impl FnOnce(&mut PollMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            f(&mut metrics);
        }
    }

    pub fn record_dispatched(&self) {
        self.update(|m| m.dispatched += 1);
    }

    pub fn record_applied(&self) {
        self.update(|m| m.applied += 1);
    }

    /// A response that arrived after a newer one had already been applied.
    pub fn record_discarded(&self) {
        self.update(|m| m.discarded += 1);
    }

    pub fn record_error(&self) {
        self.update(|m| m.errors += 1);
    }

    pub fn record_malformed(&self) {
        self.update(|m| m.malformed += 1);
    }

    pub fn snapshot(&self) -> PollMetrics {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_dispatched();
        metrics.record_dispatched();
        metrics.record_applied();
        metrics.record_discarded();
        metrics.record_malformed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dispatched, 2);
        assert_eq!(snapshot.applied, 1);
        assert_eq!(snapshot.discarded, 1);
        assert_eq!(snapshot.errors, 0);
        assert_eq!(snapshot.malformed, 1);
    }
}
