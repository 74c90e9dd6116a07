//! Postal-Code Catalog Service Library
//!
//! This library crate defines the core modules that make up the lookup service.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of three loosely coupled subsystems plus configuration:
//!
//! - **`catalog`**: The reference-data engine. Loads the national postal-code
//!   catalog once from a flat delimited file, builds inverted indices, and
//!   answers exact, substring, prefix, and multi-field filtered queries.
//! - **`cache`**: Bounded, time-expiring memoization in front of the more
//!   expensive catalog queries. One independently configured cache per query
//!   shape.
//! - **`ratelimit`**: Per-client token-bucket admission control applied to
//!   inbound queries, with whitelist bypass and idle-bucket expiry.
//! - **`config`**: Process configuration read from environment variables.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod ratelimit;
