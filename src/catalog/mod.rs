//! Catalog Service Module
//!
//! The core component answering lookup and substring-search queries against
//! the national postal-code reference catalog.
//!
//! ## Overview
//! The catalog is loaded exactly once at startup from a flat `|`-delimited
//! file. After loading, all structures are immutable and shared, so queries
//! run lock-free from any number of concurrent request tasks.
//!
//! ## Responsibilities
//! - **Normalization**: Folding text to a diacritic-free, case-insensitive
//!   comparison key used by every search.
//! - **Loading**: Encoding detection, line parsing, per-line validation with
//!   skip-and-count error recovery, index construction.
//! - **Retrieval**: Exact lookup, substring search over inverted indices,
//!   bounded prefix search, multi-field filtered search, aggregate listings.
//! - **API**: Exposing the catalog via RESTful HTTP endpoints.
//!
//! ## Submodules
//! - **`normalize`**: Text normalization utilities.
//! - **`loader`**: Startup ingestion of the source file.
//! - **`index`**: The frozen primary map and inverted indices plus all query
//!   operations.
//! - **`handlers`**: HTTP request handlers for the Axum web server.
//! - **`types`**: Data Transfer Objects (DTOs) for API communication.

pub mod handlers;
pub mod index;
pub mod loader;
pub mod normalize;
pub mod types;
