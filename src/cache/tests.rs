//! Cache Module Tests
//!
//! Validates the bounded cache primitive (capacity, both expiry policies,
//! hit/miss accounting) and the cached catalog front-end (key normalization,
//! shared result identity, error results never cached).

#[cfg(test)]
mod tests {
    use crate::cache::bounded::{BoundedCache, ExpiryPolicy};
    use crate::cache::service::CachedCatalog;
    use crate::catalog::index::QueryError;
    use crate::catalog::loader::parse_catalog;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    const FIXTURE: &str = "\
meta
header
01000|San Ángel|Colonia|Álvaro Obregón|Ciudad de México|CDMX|Urbano
44100|Centro|Colonia|Guadalajara|Jalisco|Guadalajara|Urbano
44100|Mexicaltzingo|Barrio|Guadalajara|Jalisco|Guadalajara|Urbano
";

    fn cached_fixture() -> CachedCatalog {
        CachedCatalog::new(parse_catalog(FIXTURE.as_bytes()))
    }

    // ============================================================
    // BOUNDED CACHE - basic behavior
    // ============================================================

    #[test]
    fn test_cache_miss_then_hit() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(10, ExpiryPolicy::AfterWrite(Duration::from_secs(60)));

        assert_eq!(cache.get(&"a".to_string()), None);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        let (hits, misses) = cache.stats();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
    }

    #[test]
    fn test_cache_clear_forces_recomputation_path() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(10, ExpiryPolicy::AfterWrite(Duration::from_secs(60)));
        cache.insert("a".to_string(), 1);
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    // ============================================================
    // BOUNDED CACHE - expiry policies
    // ============================================================

    #[test]
    fn test_expire_after_write_ignores_reads() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(10, ExpiryPolicy::AfterWrite(Duration::from_secs(10)));
        let t0 = Instant::now();

        cache.insert_at("a".to_string(), 1, t0);
        // Reads inside the window keep succeeding but do not push the
        // deadline out.
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(9)), Some(1));
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(11)), None);
    }

    #[test]
    fn test_expire_after_access_is_refreshed_by_reads() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(10, ExpiryPolicy::AfterAccess(Duration::from_secs(10)));
        let t0 = Instant::now();

        cache.insert_at("a".to_string(), 1, t0);
        // Each read restarts the idle window.
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(8)), Some(1));
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(16)), Some(1));
        // Idle past the window without reads: gone.
        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(27)), None);
    }

    #[test]
    fn test_expired_slot_is_removed_on_read() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(10, ExpiryPolicy::AfterWrite(Duration::from_secs(1)));
        let t0 = Instant::now();
        cache.insert_at("a".to_string(), 1, t0);

        assert_eq!(cache.get_at(&"a".to_string(), t0 + Duration::from_secs(2)), None);
        assert!(cache.is_empty());
    }

    // ============================================================
    // BOUNDED CACHE - capacity
    // ============================================================

    #[test]
    fn test_capacity_evicts_stalest_write() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(2, ExpiryPolicy::AfterWrite(Duration::from_secs(60)));
        let t0 = Instant::now();

        cache.insert_at("old".to_string(), 1, t0);
        cache.insert_at("mid".to_string(), 2, t0 + Duration::from_secs(1));
        cache.insert_at("new".to_string(), 3, t0 + Duration::from_secs(2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&"old".to_string(), t0 + Duration::from_secs(3)), None);
        assert_eq!(cache.get_at(&"mid".to_string(), t0 + Duration::from_secs(3)), Some(2));
        assert_eq!(cache.get_at(&"new".to_string(), t0 + Duration::from_secs(3)), Some(3));
    }

    #[test]
    fn test_capacity_prefers_dropping_expired_slots() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(2, ExpiryPolicy::AfterWrite(Duration::from_secs(5)));
        let t0 = Instant::now();

        cache.insert_at("expired".to_string(), 1, t0);
        cache.insert_at("live".to_string(), 2, t0 + Duration::from_secs(4));
        // "expired" is past its window by now, so it goes first even though
        // "live" was written earlier than the new slot.
        cache.insert_at("fresh".to_string(), 3, t0 + Duration::from_secs(6));

        assert_eq!(cache.get_at(&"live".to_string(), t0 + Duration::from_secs(7)), Some(2));
        assert_eq!(cache.get_at(&"fresh".to_string(), t0 + Duration::from_secs(7)), Some(3));
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let cache: BoundedCache<String, u32> =
            BoundedCache::new(2, ExpiryPolicy::AfterWrite(Duration::from_secs(60)));
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("a".to_string(), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(10));
        assert_eq!(cache.get(&"b".to_string()), Some(2));
    }

    // ============================================================
    // CACHED CATALOG
    // ============================================================

    #[test]
    fn test_repeated_search_returns_shared_result() {
        let catalog = cached_fixture();

        let first = catalog.search_by_region("jalisco").unwrap();
        let second = catalog.search_by_region("jalisco").unwrap();

        // Same Arc: the second call was served from cache, not recomputed.
        assert!(Arc::ptr_eq(&first, &second));

        let (hits, misses) = catalog.region_cache.stats();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
    }

    #[test]
    fn test_cache_key_is_normalized() {
        let catalog = cached_fixture();

        let first = catalog.search_by_region("Jalisco").unwrap();
        let second = catalog.search_by_region("JALISCO").unwrap();
        let third = catalog.search_by_region("  jalisco ").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_forced_expiry_triggers_recomputation() {
        let catalog = cached_fixture();

        let first = catalog.search_by_region("jalisco").unwrap();
        catalog.region_cache.clear();
        let second = catalog.search_by_region("jalisco").unwrap();

        // Recomputed: a fresh list, equal in content but not the same Arc.
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), second.len());

        let (_, misses) = catalog.region_cache.stats();
        assert_eq!(misses, 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let catalog = cached_fixture();

        for _ in 0..2 {
            assert!(matches!(
                catalog.search_by_region("atlantis"),
                Err(QueryError::NotFound(_))
            ));
        }
        assert_eq!(catalog.region_cache.len(), 0);

        let (hits, misses) = catalog.region_cache.stats();
        assert_eq!(hits, 0);
        assert_eq!(misses, 2);
    }

    #[test]
    fn test_cached_results_match_fresh_results() {
        let catalog = cached_fixture();

        let fresh = catalog.search_by_prefix("44", 10).unwrap();
        let cached = catalog.search_by_prefix("44", 10).unwrap();
        assert_eq!(*fresh, *cached);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].code, "44100");
    }

    #[test]
    fn test_prefix_cache_key_includes_limit() {
        let catalog = cached_fixture();

        let wide = catalog.search_by_prefix("0", 10).unwrap();
        let narrow = catalog.search_by_prefix("0", 1).unwrap();
        // Different limits are distinct queries, served independently.
        assert!(!Arc::ptr_eq(&wide, &narrow));
    }

    #[test]
    fn test_get_by_code_cached_identity() {
        let catalog = cached_fixture();

        let first = catalog.get_by_code("01000").unwrap();
        let second = catalog.get_by_code("01000").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_region_listing_cached() {
        let catalog = cached_fixture();

        let first = catalog.list_regions();
        let second = catalog.list_regions();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_stats_passthrough() {
        let catalog = cached_fixture();
        let stats = catalog.stats();
        assert_eq!(stats.total_codes, 2);
        assert_eq!(stats.total_settlements, 3);
        assert!(catalog.data_loaded());
        assert_eq!(catalog.entry_count(), 2);
    }
}
