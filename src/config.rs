//! Process Configuration
//!
//! Reads the service configuration from environment variables once at startup.
//! Unset or unparseable variables fall back to defaults, so the binary always
//! starts with a usable configuration.

use std::env;
use std::net::SocketAddr;

/// Default location of the bundled catalog file, used when `CATALOG_FILE`
/// is not set. If neither exists the service starts degraded (no data).
pub const DEFAULT_CATALOG_FILE: &str = "data/CPdescarga.txt";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the delimited catalog source file.
    pub catalog_file: String,
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    pub rate_limit: RateLimitConfig,
}

/// Rate-limiter settings. Disabled by default.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Tokens replenished per minute (greedy continuous refill).
    pub requests_per_minute: u32,
    /// Maximum tokens a bucket can hold, bounding the largest burst.
    pub burst_capacity: u32,
    /// Per-client buckets when true, one shared global bucket otherwise.
    pub per_client: bool,
    /// Client identities admitted without any accounting. Entries are exact
    /// addresses or simplified `a.b.c.0/nn` prefixes.
    pub whitelist: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_minute: 100,
            burst_capacity: 20,
            per_client: true,
            whitelist: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let catalog_file =
            env::var("CATALOG_FILE").unwrap_or_else(|_| DEFAULT_CATALOG_FILE.to_string());

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| {
                DEFAULT_BIND_ADDR
                    .parse()
                    .expect("default bind address is valid")
            });

        Self {
            catalog_file,
            bind_addr,
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: env_flag("RATELIMIT_ENABLED", defaults.enabled),
            requests_per_minute: env_number(
                "RATELIMIT_REQUESTS_PER_MINUTE",
                defaults.requests_per_minute,
            ),
            burst_capacity: env_number("RATELIMIT_BURST_CAPACITY", defaults.burst_capacity),
            per_client: env_flag("RATELIMIT_PER_CLIENT", defaults.per_client),
            whitelist: env::var("RATELIMIT_WHITELIST")
                .map(|raw| {
                    raw.split(',')
                        .map(|entry| entry.trim().to_string())
                        .filter(|entry| !entry.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn env_number(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
