//! Catalog Data Types
//!
//! Defines the catalog entry model and the Data Transfer Objects returned by
//! the HTTP layer (paged responses, aggregate summaries, error bodies).

use serde::{Deserialize, Serialize};

/// A named sub-area (neighborhood-equivalent) within a postal code.
/// Value type owned by its `CatalogEntry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub name: String,
    pub settlement_type: String,
    /// Urban/rural label, taken verbatim from the source file.
    pub zone_type: String,
}

/// One catalog entry per unique 5-digit code. Created during load, its
/// settlement list grows by append while loading and is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub locality: String,
    /// State-level administrative field ("federal entity").
    pub region: String,
    /// Municipality-level administrative field.
    pub subregion: String,
    pub settlements: Vec<Settlement>,
}

/// Lightweight projection of a `CatalogEntry` without the settlement list,
/// returned when a query's `simplified` flag is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedEntry {
    pub code: String,
    pub locality: String,
    pub region: String,
    pub subregion: String,
    pub settlements_count: usize,
}

impl SimplifiedEntry {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            code: entry.code.clone(),
            locality: entry.locality.clone(),
            region: entry.region.clone(),
            subregion: entry.subregion.clone(),
            settlements_count: entry.settlements.len(),
        }
    }
}

/// Per-region aggregate for the region listing: entry count plus the number
/// of distinct subregion strings, grouped by the exact (non-normalized)
/// region value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub name: String,
    pub entry_count: usize,
    pub subregion_count: usize,
}

/// Aggregate totals over the whole loaded catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_codes: usize,
    pub total_regions: usize,
    pub total_subregions: usize,
    pub total_settlements: usize,
}

/// A page sliced out of a full result list. The core always computes the
/// full match list; handlers slice it into this envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub first: bool,
    pub last: bool,
}

impl<T> PagedResponse<T> {
    /// Slices `[page*size, min(page*size + size, total))` out of the full
    /// list. Assumes `size >= 1` (validated at the HTTP boundary).
    pub fn paginate(results: &[T], page: usize, size: usize) -> PagedResponse<T>
    where
        T: Clone,
    {
        let total_elements = results.len();
        let total_pages = total_elements.div_ceil(size);
        let start = (page * size).min(total_elements);
        let end = (start + size).min(total_elements);

        PagedResponse {
            content: results[start..end].to_vec(),
            page_number: page,
            page_size: size,
            total_elements,
            total_pages,
            first: page == 0,
            last: page + 1 >= total_pages,
        }
    }
}

/// Structured error body returned for every caller-facing failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Health report: down while the catalog has not finished loading or ended
/// up empty, up otherwise.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub data_loaded: bool,
    pub entry_count: usize,
}
