//! Rate Limiting Module
//!
//! Per-client token-bucket admission control applied to inbound queries,
//! independent of the catalog.
//!
//! ## Core Mechanisms
//! - **Token Bucket**: Greedy continuous refill (`elapsed × rate`, capped at
//!   the burst capacity); one token consumed per admitted request.
//! - **Lazy Buckets**: Buckets are created on a client's first request and
//!   held in a shared concurrent map; idle buckets are swept individually
//!   once the map passes a size threshold.
//! - **Whitelist**: Exact-match and simplified dotted-prefix entries bypass
//!   accounting entirely.
//!
//! ## Submodules
//! - **`bucket`**: The token-bucket state machine.
//! - **`limiter`**: Bucket map, whitelist, admission decisions.
//! - **`middleware`**: Axum layer translating decisions into HTTP signals.

pub mod bucket;
pub mod limiter;
pub mod middleware;

#[cfg(test)]
mod tests;
