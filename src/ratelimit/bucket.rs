use std::time::Instant;

/// Token-bucket state machine for one rate-limit key.
///
/// Tokens replenish continuously ("greedy" refill, not fixed windows): each
/// admission check first credits `elapsed × rate`, capped at the capacity,
/// then tries to consume one token. A bucket starts full, so the capacity is
/// also the largest instantaneous burst a fresh key can spend.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_minute: u32, now: Instant) -> Self {
        Self {
            capacity: f64::from(capacity),
            tokens: f64::from(capacity),
            refill_per_sec: f64::from(refill_per_minute) / 60.0,
            last_refill: now,
        }
    }

    /// Refills for the elapsed time and consumes one token if available.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Whole tokens currently available, as reported to the caller.
    pub fn available(&self) -> u64 {
        self.tokens as u64
    }
}
