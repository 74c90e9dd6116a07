//! Catalog Index
//!
//! Holds the primary code-keyed map and the inverted indices, and implements
//! every query operation. The index is constructed once by the loader and is
//! immutable afterwards, so all operations take `&self` and are safe for
//! unlimited concurrent callers without locking.
//!
//! The inverted indices map a normalized region (or subregion) string to the
//! set of entries carrying that value. Entries are stored as shared
//! references into the primary map, not as codes, so a search never pays a
//! second lookup on the hot path. Each entry appears under exactly one
//! normalized key per index.

use super::normalize::normalize;
use super::types::{CatalogEntry, CatalogStats, RegionSummary, Settlement};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::LazyLock;
use thiserror::Error;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("code pattern is valid"));
static PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,5}$").expect("prefix pattern is valid"));

/// Largest number of results a prefix search may return.
pub const MAX_PREFIX_RESULTS: usize = 50;

/// Caller-facing failure taxonomy. Both variants are deterministic functions
/// of the query input; neither is retryable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Valid query, no matching entries.
    #[error("not found: {0}")]
    NotFound(String),
    /// The query itself is malformed (blank term, non-digit code, no filters).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Optional normalized-substring filters for the advanced search. The three
/// settlement-level filters are AND-ed per settlement: an entry matches only
/// if at least one of its settlements satisfies all of them simultaneously.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub settlement: Option<String>,
    pub settlement_type: Option<String>,
    pub zone_type: Option<String>,
}

impl SearchFilters {
    fn needle(field: &Option<String>) -> Option<String> {
        field
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(normalize)
    }

    /// Canonical serialization of the filter set, used as the cache key.
    pub fn cache_key(&self) -> String {
        format!(
            "r={}|s={}|n={}|t={}|z={}",
            Self::needle(&self.region).unwrap_or_default(),
            Self::needle(&self.subregion).unwrap_or_default(),
            Self::needle(&self.settlement).unwrap_or_default(),
            Self::needle(&self.settlement_type).unwrap_or_default(),
            Self::needle(&self.zone_type).unwrap_or_default(),
        )
    }
}

pub struct CatalogIndex {
    /// Primary map. Sorted keys give the bounded prefix scan directly.
    by_code: BTreeMap<String, Arc<CatalogEntry>>,
    /// Normalized region -> entries with that region.
    by_region: HashMap<String, Vec<Arc<CatalogEntry>>>,
    /// Normalized subregion -> entries with that subregion.
    by_subregion: HashMap<String, Vec<Arc<CatalogEntry>>>,
}

impl CatalogIndex {
    /// An index with no entries, used when no source file could be opened.
    /// Every lookup against it reports NotFound.
    pub fn empty() -> Self {
        Self {
            by_code: BTreeMap::new(),
            by_region: HashMap::new(),
            by_subregion: HashMap::new(),
        }
    }

    /// Freezes fully built entries into the immutable index, deriving both
    /// inverted indices from each entry's un-normalized field values.
    pub fn freeze(entries: BTreeMap<String, CatalogEntry>) -> Self {
        let mut by_code = BTreeMap::new();
        let mut by_region: HashMap<String, Vec<Arc<CatalogEntry>>> = HashMap::new();
        let mut by_subregion: HashMap<String, Vec<Arc<CatalogEntry>>> = HashMap::new();

        for (code, entry) in entries {
            let entry = Arc::new(entry);
            by_region
                .entry(normalize(&entry.region))
                .or_default()
                .push(entry.clone());
            by_subregion
                .entry(normalize(&entry.subregion))
                .or_default()
                .push(entry.clone());
            by_code.insert(code, entry);
        }

        Self {
            by_code,
            by_region,
            by_subregion,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.by_code.len()
    }

    /// Exact map lookup by full 5-digit code.
    pub fn get_by_code(&self, code: &str) -> Result<Arc<CatalogEntry>, QueryError> {
        if !CODE_PATTERN.is_match(code) {
            return Err(QueryError::InvalidArgument(format!(
                "postal code must be exactly 5 digits: {code}"
            )));
        }

        self.by_code
            .get(code)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(format!("postal code not found: {code}")))
    }

    /// Settlement list of a single entry.
    pub fn settlements(&self, code: &str) -> Result<Vec<Settlement>, QueryError> {
        self.get_by_code(code)
            .map(|entry| entry.settlements.clone())
    }

    /// Substring search over the normalized region index: every index key
    /// containing the normalized term contributes its entry set.
    pub fn search_by_region(&self, term: &str) -> Result<Vec<Arc<CatalogEntry>>, QueryError> {
        let results = Self::scan_inverted(&self.by_region, term)?;
        if results.is_empty() {
            return Err(QueryError::NotFound(format!(
                "no postal codes found for region: {term}"
            )));
        }
        Ok(results)
    }

    /// Symmetric to `search_by_region` over the subregion index.
    pub fn search_by_subregion(&self, term: &str) -> Result<Vec<Arc<CatalogEntry>>, QueryError> {
        let results = Self::scan_inverted(&self.by_subregion, term)?;
        if results.is_empty() {
            return Err(QueryError::NotFound(format!(
                "no postal codes found for subregion: {term}"
            )));
        }
        Ok(results)
    }

    fn scan_inverted(
        index: &HashMap<String, Vec<Arc<CatalogEntry>>>,
        term: &str,
    ) -> Result<Vec<Arc<CatalogEntry>>, QueryError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(QueryError::InvalidArgument(
                "search term must not be blank".to_string(),
            ));
        }

        let needle = normalize(term);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut results = Vec::new();

        for (key, entries) in index {
            if !key.contains(&needle) {
                continue;
            }
            // An entry is indexed under one key per field, but the union
            // tolerates the same entry arriving from several keys.
            for entry in entries {
                if seen.insert(entry.code.as_str()) {
                    results.push(entry.clone());
                }
            }
        }

        Ok(results)
    }

    /// All codes starting with the 1-5 digit prefix, ascending, truncated to
    /// `limit` clamped into `1..=50`.
    pub fn search_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<Arc<CatalogEntry>>, QueryError> {
        if !PREFIX_PATTERN.is_match(prefix) {
            return Err(QueryError::InvalidArgument(format!(
                "code prefix must be 1 to 5 digits: {prefix}"
            )));
        }

        let limit = limit.clamp(1, MAX_PREFIX_RESULTS);
        let results: Vec<Arc<CatalogEntry>> = self
            .by_code
            .range(prefix.to_string()..)
            .take_while(|(code, _)| code.starts_with(prefix))
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect();

        if results.is_empty() {
            return Err(QueryError::NotFound(format!(
                "no postal codes start with: {prefix}"
            )));
        }
        Ok(results)
    }

    /// Multi-field filtered search. At least one filter must be non-blank.
    /// Region/subregion filters apply to the entry; the settlement-level
    /// filters must all hold on a single settlement. Results ascend by code.
    pub fn advanced_search(
        &self,
        filters: &SearchFilters,
    ) -> Result<Vec<Arc<CatalogEntry>>, QueryError> {
        let region = SearchFilters::needle(&filters.region);
        let subregion = SearchFilters::needle(&filters.subregion);
        let settlement = SearchFilters::needle(&filters.settlement);
        let settlement_type = SearchFilters::needle(&filters.settlement_type);
        let zone_type = SearchFilters::needle(&filters.zone_type);

        if region.is_none()
            && subregion.is_none()
            && settlement.is_none()
            && settlement_type.is_none()
            && zone_type.is_none()
        {
            return Err(QueryError::InvalidArgument(
                "at least one search filter is required".to_string(),
            ));
        }

        let wants_settlement =
            settlement.is_some() || settlement_type.is_some() || zone_type.is_some();

        // Iterating the primary map yields codes in ascending order already.
        let mut results = Vec::new();
        for entry in self.by_code.values() {
            if let Some(needle) = &region
                && !normalize(&entry.region).contains(needle)
            {
                continue;
            }
            if let Some(needle) = &subregion
                && !normalize(&entry.subregion).contains(needle)
            {
                continue;
            }
            if wants_settlement {
                let any_settlement_matches = entry.settlements.iter().any(|s| {
                    settlement
                        .as_deref()
                        .is_none_or(|needle| normalize(&s.name).contains(needle))
                        && settlement_type
                            .as_deref()
                            .is_none_or(|needle| normalize(&s.settlement_type).contains(needle))
                        && zone_type
                            .as_deref()
                            .is_none_or(|needle| normalize(&s.zone_type).contains(needle))
                });
                if !any_settlement_matches {
                    continue;
                }
            }
            results.push(entry.clone());
        }

        if results.is_empty() {
            return Err(QueryError::NotFound(
                "no postal codes match the given filters".to_string(),
            ));
        }
        Ok(results)
    }

    /// Groups entries by their exact (non-normalized) region string and
    /// reports entry and distinct-subregion counts, sorted by region name.
    pub fn list_regions(&self) -> Vec<RegionSummary> {
        let mut groups: BTreeMap<&str, (usize, BTreeSet<&str>)> = BTreeMap::new();

        for entry in self.by_code.values() {
            let group = groups.entry(entry.region.as_str()).or_default();
            group.0 += 1;
            group.1.insert(entry.subregion.as_str());
        }

        groups
            .into_iter()
            .map(|(name, (entry_count, subregions))| RegionSummary {
                name: name.to_string(),
                entry_count,
                subregion_count: subregions.len(),
            })
            .collect()
    }

    /// Distinct subregion names of every region matching the term,
    /// alphabetically sorted.
    pub fn list_subregions_for_region(&self, term: &str) -> Result<Vec<String>, QueryError> {
        let matches = Self::scan_inverted(&self.by_region, term)?;
        if matches.is_empty() {
            return Err(QueryError::NotFound(format!("region not found: {term}")));
        }

        let subregions: BTreeSet<String> = matches
            .iter()
            .map(|entry| entry.subregion.clone())
            .collect();
        Ok(subregions.into_iter().collect())
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total_codes: self.by_code.len(),
            total_regions: self.by_region.len(),
            total_subregions: self.by_subregion.len(),
            total_settlements: self
                .by_code
                .values()
                .map(|entry| entry.settlements.len())
                .sum(),
        }
    }
}
