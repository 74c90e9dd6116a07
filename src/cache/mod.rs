//! Result Cache Module
//!
//! Bounded, time-expiring memoization in front of the catalog's more
//! expensive query operations.
//!
//! ## Overview
//! One independently configured cache per query shape (exact code, region
//! search, subregion search, prefix search, advanced search, listings). A
//! hit returns the previously computed result reference; a miss computes,
//! stores, and returns. Correctness holds identically either way; the cache
//! is purely an optimization layer.
//!
//! ## Submodules
//! - **`bounded`**: The cache primitive (capacity + write- or access-based
//!   expiry, hit/miss counters), safe under concurrent use.
//! - **`service`**: The cached query front-end wrapping the catalog index.

pub mod bounded;
pub mod service;

#[cfg(test)]
mod tests;
