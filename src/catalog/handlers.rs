//! Catalog HTTP Handlers
//!
//! Thin layer over the cached catalog: parameter validation, query dispatch,
//! pagination slicing, and translation of `QueryError` into client-error
//! responses. The core always returns the full match list; slicing happens
//! here.

use super::index::{QueryError, SearchFilters};
use super::types::{
    CatalogEntry, CatalogStats, ErrorResponse, HealthResponse, PagedResponse, RegionSummary,
    Settlement, SimplifiedEntry,
};
use crate::cache::service::CachedCatalog;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_PREFIX_LIMIT: usize = 10;

/// Adapter turning the core error taxonomy into HTTP responses.
pub struct ApiError(QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            QueryError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            QueryError::InvalidArgument(message) => (StatusCode::BAD_REQUEST, message),
        };
        tracing::debug!("query rejected: {}", message);
        (status, Json(ErrorResponse::new(status.as_u16(), message))).into_response()
    }
}

fn validate_size(size: usize) -> Result<(), ApiError> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ApiError(QueryError::InvalidArgument(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}"
        ))));
    }
    Ok(())
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_prefix_limit() -> usize {
    DEFAULT_PREFIX_LIMIT
}

#[derive(Deserialize)]
pub struct RegionSearchParams {
    pub region: String,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

#[derive(Deserialize)]
pub struct SubregionSearchParams {
    pub subregion: String,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

#[derive(Deserialize)]
pub struct PrefixSearchParams {
    pub code: String,
    #[serde(default = "default_prefix_limit")]
    pub limit: usize,
    #[serde(default)]
    pub simplified: bool,
}

#[derive(Deserialize)]
pub struct AdvancedSearchParams {
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub settlement: Option<String>,
    pub settlement_type: Option<String>,
    pub zone_type: Option<String>,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
    #[serde(default)]
    pub simplified: bool,
}

pub async fn handle_get_by_code(
    Path(code): Path<String>,
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Result<Json<Arc<CatalogEntry>>, ApiError> {
    Ok(Json(catalog.get_by_code(&code)?))
}

pub async fn handle_get_settlements(
    Path(code): Path<String>,
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    Ok(Json(catalog.settlements(&code)?))
}

pub async fn handle_search_by_region(
    Query(params): Query<RegionSearchParams>,
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Result<Json<PagedResponse<Arc<CatalogEntry>>>, ApiError> {
    validate_size(params.size)?;
    let results = catalog.search_by_region(&params.region)?;
    Ok(Json(PagedResponse::paginate(
        results.as_slice(),
        params.page,
        params.size,
    )))
}

pub async fn handle_search_by_subregion(
    Query(params): Query<SubregionSearchParams>,
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Result<Json<PagedResponse<Arc<CatalogEntry>>>, ApiError> {
    validate_size(params.size)?;
    let results = catalog.search_by_subregion(&params.subregion)?;
    Ok(Json(PagedResponse::paginate(
        results.as_slice(),
        params.page,
        params.size,
    )))
}

pub async fn handle_search_by_prefix(
    Query(params): Query<PrefixSearchParams>,
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Result<Response, ApiError> {
    let results = catalog.search_by_prefix(&params.code, params.limit)?;

    if params.simplified {
        let simplified: Vec<SimplifiedEntry> = results
            .iter()
            .map(|entry| SimplifiedEntry::from_entry(entry))
            .collect();
        return Ok(Json(simplified).into_response());
    }
    Ok(Json(results).into_response())
}

pub async fn handle_advanced_search(
    Query(params): Query<AdvancedSearchParams>,
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Result<Response, ApiError> {
    validate_size(params.size)?;

    let filters = SearchFilters {
        region: params.region,
        subregion: params.subregion,
        settlement: params.settlement,
        settlement_type: params.settlement_type,
        zone_type: params.zone_type,
    };
    let results = catalog.advanced_search(&filters)?;

    if params.simplified {
        let simplified: Vec<SimplifiedEntry> = results
            .iter()
            .map(|entry| SimplifiedEntry::from_entry(entry))
            .collect();
        return Ok(Json(PagedResponse::paginate(
            simplified.as_slice(),
            params.page,
            params.size,
        ))
        .into_response());
    }

    Ok(Json(PagedResponse::paginate(
        results.as_slice(),
        params.page,
        params.size,
    ))
    .into_response())
}

pub async fn handle_list_regions(
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Json<Arc<Vec<RegionSummary>>> {
    Json(catalog.list_regions())
}

pub async fn handle_list_subregions(
    Path(region): Path<String>,
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Result<Json<Arc<Vec<String>>>, ApiError> {
    Ok(Json(catalog.list_subregions_for_region(&region)?))
}

pub async fn handle_stats(
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> Json<CatalogStats> {
    Json(catalog.stats())
}

/// Readiness signal: down while the catalog never loaded or loaded empty.
pub async fn handle_health(
    Extension(catalog): Extension<Arc<CachedCatalog>>,
) -> (StatusCode, Json<HealthResponse>) {
    let entry_count = catalog.entry_count();
    let up = catalog.data_loaded() && entry_count > 0;

    let status = if up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if up { "up" } else { "down" }.to_string(),
            data_loaded: catalog.data_loaded(),
            entry_count,
        }),
    )
}
