//! Cached Catalog Front-End
//!
//! Wraps the loaded catalog with one bounded cache per query shape. Cache
//! keys are the normalized defining parameters of each query; only
//! successful results are stored, so failure paths are recomputed and stay
//! deterministic. Result lists are shared behind `Arc`, making a cache hit
//! hand back the identical list the first computation produced.

use crate::catalog::index::{QueryError, SearchFilters};
use crate::catalog::loader::Catalog;
use crate::catalog::normalize::normalize;
use crate::catalog::types::{CatalogEntry, CatalogStats, RegionSummary, Settlement};
use std::sync::Arc;
use std::time::Duration;

use super::bounded::{BoundedCache, ExpiryPolicy};

/// Shared, already-computed result list of a search query.
pub type EntryList = Arc<Vec<Arc<CatalogEntry>>>;

// Exact lookups are cheap per entry but high-traffic: large capacity with a
// long idle window. Substring scans are more expensive per entry but have a
// long tail of rarely repeated terms: small capacity, fixed age.
const CODE_CACHE_CAPACITY: usize = 10_000;
const CODE_CACHE_IDLE: Duration = Duration::from_secs(60 * 60);
const REGION_CACHE_CAPACITY: usize = 100;
const SUBREGION_CACHE_CAPACITY: usize = 200;
const PREFIX_CACHE_CAPACITY: usize = 500;
const ADVANCED_CACHE_CAPACITY: usize = 100;
const SEARCH_CACHE_AGE: Duration = Duration::from_secs(15 * 60);
// The region listing never changes post-load; one slot is enough.
const LISTING_CACHE_AGE: Duration = Duration::from_secs(60 * 60);

pub struct CachedCatalog {
    catalog: Catalog,
    pub(crate) code_cache: BoundedCache<String, Arc<CatalogEntry>>,
    pub(crate) region_cache: BoundedCache<String, EntryList>,
    pub(crate) subregion_cache: BoundedCache<String, EntryList>,
    pub(crate) prefix_cache: BoundedCache<String, EntryList>,
    pub(crate) advanced_cache: BoundedCache<String, EntryList>,
    pub(crate) region_listing_cache: BoundedCache<String, Arc<Vec<RegionSummary>>>,
    pub(crate) subregion_listing_cache: BoundedCache<String, Arc<Vec<String>>>,
}

impl CachedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            code_cache: BoundedCache::new(
                CODE_CACHE_CAPACITY,
                ExpiryPolicy::AfterAccess(CODE_CACHE_IDLE),
            ),
            region_cache: BoundedCache::new(
                REGION_CACHE_CAPACITY,
                ExpiryPolicy::AfterWrite(SEARCH_CACHE_AGE),
            ),
            subregion_cache: BoundedCache::new(
                SUBREGION_CACHE_CAPACITY,
                ExpiryPolicy::AfterWrite(SEARCH_CACHE_AGE),
            ),
            prefix_cache: BoundedCache::new(
                PREFIX_CACHE_CAPACITY,
                ExpiryPolicy::AfterWrite(SEARCH_CACHE_AGE),
            ),
            advanced_cache: BoundedCache::new(
                ADVANCED_CACHE_CAPACITY,
                ExpiryPolicy::AfterWrite(SEARCH_CACHE_AGE),
            ),
            region_listing_cache: BoundedCache::new(
                1,
                ExpiryPolicy::AfterWrite(LISTING_CACHE_AGE),
            ),
            subregion_listing_cache: BoundedCache::new(
                REGION_CACHE_CAPACITY,
                ExpiryPolicy::AfterWrite(SEARCH_CACHE_AGE),
            ),
        }
    }

    pub fn data_loaded(&self) -> bool {
        self.catalog.data_loaded
    }

    pub fn entry_count(&self) -> usize {
        self.catalog.index.entry_count()
    }

    pub fn get_by_code(&self, code: &str) -> Result<Arc<CatalogEntry>, QueryError> {
        lookup_or_compute(&self.code_cache, code.to_string(), || {
            self.catalog.index.get_by_code(code)
        })
    }

    pub fn settlements(&self, code: &str) -> Result<Vec<Settlement>, QueryError> {
        self.get_by_code(code).map(|entry| entry.settlements.clone())
    }

    pub fn search_by_region(&self, term: &str) -> Result<EntryList, QueryError> {
        lookup_or_compute(&self.region_cache, normalize(term.trim()), || {
            self.catalog.index.search_by_region(term).map(Arc::new)
        })
    }

    pub fn search_by_subregion(&self, term: &str) -> Result<EntryList, QueryError> {
        lookup_or_compute(&self.subregion_cache, normalize(term.trim()), || {
            self.catalog.index.search_by_subregion(term).map(Arc::new)
        })
    }

    pub fn search_by_prefix(&self, prefix: &str, limit: usize) -> Result<EntryList, QueryError> {
        let limit = limit.clamp(1, crate::catalog::index::MAX_PREFIX_RESULTS);
        let key = format!("{prefix}:{limit}");
        lookup_or_compute(&self.prefix_cache, key, || {
            self.catalog
                .index
                .search_by_prefix(prefix, limit)
                .map(Arc::new)
        })
    }

    pub fn advanced_search(&self, filters: &SearchFilters) -> Result<EntryList, QueryError> {
        lookup_or_compute(&self.advanced_cache, filters.cache_key(), || {
            self.catalog.index.advanced_search(filters).map(Arc::new)
        })
    }

    pub fn list_regions(&self) -> Arc<Vec<RegionSummary>> {
        let listed = lookup_or_compute(&self.region_listing_cache, String::new(), || {
            Ok(Arc::new(self.catalog.index.list_regions()))
        });
        // The compute path is infallible here.
        listed.unwrap_or_else(|_| Arc::new(Vec::new()))
    }

    pub fn list_subregions_for_region(&self, term: &str) -> Result<Arc<Vec<String>>, QueryError> {
        lookup_or_compute(&self.subregion_listing_cache, normalize(term.trim()), || {
            self.catalog
                .index
                .list_subregions_for_region(term)
                .map(Arc::new)
        })
    }

    pub fn stats(&self) -> CatalogStats {
        self.catalog.index.stats()
    }
}

fn lookup_or_compute<V: Clone>(
    cache: &BoundedCache<String, V>,
    key: String,
    compute: impl FnOnce() -> Result<V, QueryError>,
) -> Result<V, QueryError> {
    if let Some(hit) = cache.get(&key) {
        return Ok(hit);
    }
    let value = compute()?;
    cache.insert(key, value.clone());
    Ok(value)
}
