//! Bounded reading history and trend estimation.
//!
//! A fixed-capacity ring of `(timestamp, temperature, humidity)` samples.
//! Append-only from the caller's perspective; the oldest sample is evicted
//! on overflow. Backed by a `heapless::Deque`, so memory is bounded and
//! append/evict are O(1).

use std::time::Duration;

use heapless::Deque;

/// Compile-time upper bound on the history ring. The configured
/// `history_samples` must not exceed this.
pub const MAX_HISTORY_SAMPLES: usize = 64;

/// One sensor sample with its monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub at: Duration,
    pub temperature: f32,
    pub humidity: f32,
}

/// Fixed-capacity ordered reading history (oldest first).
pub struct ReadingHistory {
    buf: Deque<Reading, MAX_HISTORY_SAMPLES>,
    capacity: usize,
}

impl ReadingHistory {
    /// `capacity` is clamped to `2..=MAX_HISTORY_SAMPLES` (config validation
    /// rejects out-of-range values before we get here).
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Deque::new(),
            capacity: capacity.clamp(2, MAX_HISTORY_SAMPLES),
        }
    }

    /// Append a sample, evicting the oldest beyond capacity.
    pub fn push(&mut self, reading: Reading) {
        while self.buf.len() >= self.capacity {
            let _ = self.buf.pop_front();
        }
        // Cannot fail: capacity <= MAX_HISTORY_SAMPLES and we just made room.
        let _ = self.buf.push_back(reading);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.buf.back()
    }

    /// Linear rate of change per minute of `field`, over samples no older
    /// than `window`.
    ///
    /// Returns `None` — "unknown", never zero — with fewer than two samples
    /// in the window or a span under one second. Callers must treat an
    /// unknown rate as "no predictive signal", not as "stable".
    pub fn rate_per_minute(
        &self,
        now: Duration,
        window: Duration,
        field: impl Fn(&Reading) -> f32,
    ) -> Option<f32> {
        if self.buf.len() < 2 {
            return None;
        }

        let mut first: Option<&Reading> = None;
        let mut last: Option<&Reading> = None;
        for r in self.buf.iter() {
            if now.saturating_sub(r.at) <= window {
                if first.is_none() {
                    first = Some(r);
                }
                last = Some(r);
            }
        }
        let (first, last) = (first?, last?);

        let span = last.at.saturating_sub(first.at);
        if span < Duration::from_secs(1) {
            return None;
        }

        let change = field(last) - field(first);
        let rate_per_second = change / span.as_secs_f32();
        Some(rate_per_second * 60.0)
    }

    /// Temperature trend (°C per minute), or `None` when unknown.
    pub fn temp_rate_per_minute(&self, now: Duration, window: Duration) -> Option<f32> {
        self.rate_per_minute(now, window, |r| r.temperature)
    }

    /// Humidity trend (% per minute), or `None` when unknown.
    pub fn humidity_rate_per_minute(&self, now: Duration, window: Duration) -> Option<f32> {
        self.rate_per_minute(now, window, |r| r.humidity)
    }
}
