//! Rate Limiter
//!
//! Holds the lazily created per-key buckets in a concurrent map and turns
//! each inbound request into an admission decision. Bucket accounting runs
//! under the map's per-entry exclusive access, so concurrent checks on the
//! same key cannot lose updates and over-admit.

use super::bucket::TokenBucket;
use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Fixed retry hint reported with every rejection.
pub const RETRY_AFTER_SECS: u64 = 60;

/// Key used for every request when limiting is configured as global.
const GLOBAL_KEY: &str = "global";

/// Once the bucket map holds more keys than this, idle entries are swept.
const MAX_TRACKED_KEYS: usize = 10_000;

/// A bucket unused for this long is dropped by the sweep. Dropping it only
/// forgets a full-or-refilling bucket for a quiet client, never an active
/// one, so no caller's accounting is reset while in use.
const BUCKET_IDLE_TTL: Duration = Duration::from_secs(10 * 60);

/// Outcome of an admission check.
#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Limiting disabled or the client is whitelisted: no accounting at all.
    Bypassed,
    Admitted {
        limit: u32,
        remaining: u64,
    },
    Rejected {
        limit: u32,
        retry_after_secs: u64,
    },
}

struct BucketSlot {
    bucket: TokenBucket,
    last_seen: Instant,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, BucketSlot>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    pub fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    pub(crate) fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        if !self.config.enabled {
            return RateLimitDecision::Bypassed;
        }

        if self.is_whitelisted(client) {
            tracing::debug!("client {} is whitelisted, skipping rate limit", client);
            return RateLimitDecision::Bypassed;
        }

        let key = if self.config.per_client {
            client
        } else {
            GLOBAL_KEY
        };

        self.sweep_idle(now);

        let mut slot = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| BucketSlot {
                bucket: TokenBucket::new(
                    self.config.burst_capacity,
                    self.config.requests_per_minute,
                    now,
                ),
                last_seen: now,
            });
        slot.last_seen = now;

        if slot.bucket.try_consume(now) {
            RateLimitDecision::Admitted {
                limit: self.config.requests_per_minute,
                remaining: slot.bucket.available(),
            }
        } else {
            tracing::warn!("rate limit exceeded for client {}", client);
            RateLimitDecision::Rejected {
                limit: self.config.requests_per_minute,
                retry_after_secs: RETRY_AFTER_SECS,
            }
        }
    }

    /// Per-entry idle expiry: once the map outgrows the threshold, only
    /// buckets idle past the TTL are dropped, leaving active clients'
    /// accounting untouched.
    fn sweep_idle(&self, now: Instant) {
        if self.buckets.len() <= MAX_TRACKED_KEYS {
            return;
        }
        let before = self.buckets.len();
        self.buckets
            .retain(|_, slot| now.saturating_duration_since(slot.last_seen) <= BUCKET_IDLE_TTL);
        tracing::info!(
            "swept idle rate-limit buckets: {} -> {}",
            before,
            self.buckets.len()
        );
    }

    /// Whitelist matching: exact string match, or the simplified
    /// dotted-prefix form for `a.b.c.d/nn` entries. The prefix check only
    /// compares the network address up to its last dot and is NOT a correct
    /// CIDR subnet match; non-aligned prefixes admit unrelated neighbors.
    /// Kept as a documented limitation of the original behavior.
    pub fn is_whitelisted(&self, client: &str) -> bool {
        for entry in &self.config.whitelist {
            if entry == client {
                return true;
            }
            if entry.contains('/') && Self::matches_network_prefix(client, entry) {
                return true;
            }
        }
        false
    }

    fn matches_network_prefix(client: &str, cidr: &str) -> bool {
        let Some((network, _)) = cidr.split_once('/') else {
            return false;
        };
        match network.rfind('.') {
            Some(last_dot) => client.starts_with(&network[..last_dot]),
            None => false,
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}
