// Sliding-window sample-rate estimation.
//
// Arrival timestamps of accepted samples land in a fixed-capacity FIFO.
// The rate is plain count-over-span with no decay or weighting, and it
// is only recomputed once the window holds enough timestamps.

use std::collections::VecDeque;

/// Capacity of the arrival-timestamp window, about five seconds of
/// samples at the nominal 60 Hz device rate.
pub const WINDOW_CAPACITY: usize = 300;

/// The window must hold more than this many timestamps before a rate is
/// computed.
pub const MIN_WINDOW_SAMPLES: usize = 10;

/// Count-over-span sample-rate estimator.
///
/// While the window is short, or the span is degenerate, the previously
/// computed value is reported (0 before the first computation).
#[derive(Debug, Clone)]
pub struct RateEstimator {
    window: VecDeque<f64>,
    rate_hz: f64,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
            rate_hz: 0.0,
        }
    }

    /// Records one sample arrival (seconds on the session clock) and
    /// returns the current estimate in Hz. The oldest timestamp is
    /// evicted once the window is full.
    pub fn record(&mut self, arrival_secs: f64) -> f64 {
        if self.window.len() == WINDOW_CAPACITY {
            self.window.pop_front();
        }
        self.window.push_back(arrival_secs);

        if self.window.len() > MIN_WINDOW_SAMPLES {
            if let Some(&oldest) = self.window.front() {
                let span = arrival_secs - oldest;
                if span > 0.0 {
                    self.rate_hz = self.window.len() as f64 / span;
                }
            }
        }
        self.rate_hz
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_window_reports_zero() {
        let mut estimator = RateEstimator::new();
        for i in 0..10 {
            assert_eq!(estimator.record(i as f64 / 60.0), 0.0);
        }
        assert_eq!(estimator.rate_hz(), 0.0);
        assert_eq!(estimator.sample_count(), 10);
    }

    #[test]
    fn test_rate_after_eleven_even_timestamps() {
        let mut estimator = RateEstimator::new();
        let mut rate = 0.0;
        for i in 0..11 {
            rate = estimator.record(i as f64 / 60.0);
        }
        // 11 samples over a 10/60 s span.
        assert!((rate - 66.0).abs() < 1e-9, "rate was {rate}");
        assert!((estimator.rate_hz() - 66.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_evicts_oldest_at_capacity() {
        let mut estimator = RateEstimator::new();
        for i in 0..(WINDOW_CAPACITY + 50) {
            estimator.record(i as f64 * 0.01);
        }
        assert_eq!(estimator.sample_count(), WINDOW_CAPACITY);

        // Steady 100 Hz arrivals over the full window.
        let rate = estimator.rate_hz();
        let expected = WINDOW_CAPACITY as f64 / ((WINDOW_CAPACITY - 1) as f64 * 0.01);
        assert!((rate - expected).abs() < 1e-6, "rate was {rate}");
    }

    #[test]
    fn test_zero_span_keeps_prior_value() {
        let mut estimator = RateEstimator::new();
        for i in 0..11 {
            estimator.record(i as f64 / 60.0);
        }
        let before = estimator.rate_hz();
        assert!(before > 0.0);

        // A burst of identical timestamps must not divide by zero; the
        // prior estimate stands until the span grows again.
        let mut estimator2 = RateEstimator::new();
        for _ in 0..20 {
            assert_eq!(estimator2.record(5.0), 0.0);
        }
    }

    #[test]
    fn test_rate_tracks_slowing_device() {
        let mut estimator = RateEstimator::new();
        for i in 0..30 {
            estimator.record(i as f64 / 60.0);
        }
        let fast = estimator.rate_hz();
        for i in 0..30 {
            estimator.record(0.5 + i as f64 / 10.0);
        }
        assert!(estimator.rate_hz() < fast);
    }
}
