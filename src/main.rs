use axum::{
    Router,
    extract::Extension,
    middleware,
    routing::get,
};
use postal_catalog::cache::service::CachedCatalog;
use postal_catalog::catalog::handlers::{
    handle_advanced_search, handle_get_by_code, handle_get_settlements, handle_health,
    handle_list_regions, handle_list_subregions, handle_search_by_prefix,
    handle_search_by_region, handle_search_by_subregion, handle_stats,
};
use postal_catalog::catalog::loader::load_catalog;
use postal_catalog::config::AppConfig;
use postal_catalog::ratelimit::limiter::RateLimiter;
use postal_catalog::ratelimit::middleware::rate_limit_middleware;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "starting postal-catalog (rate limiting {})",
        if config.rate_limit.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    // 1. Load the catalog, synchronously, before accepting any query.
    let catalog = load_catalog(&config.catalog_file)?;
    if catalog.data_loaded {
        tracing::info!(
            "catalog ready: {} postal codes",
            catalog.index.entry_count()
        );
    } else {
        tracing::warn!("running degraded: catalog data unavailable");
    }

    let catalog = Arc::new(CachedCatalog::new(catalog));
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

    // 2. HTTP Router: query routes behind the rate limiter, health outside it.
    let query_routes = Router::new()
        .route("/postal-codes", get(handle_search_by_region))
        .route("/postal-codes/search", get(handle_search_by_prefix))
        .route("/postal-codes/advanced", get(handle_advanced_search))
        .route("/postal-codes/by-subregion", get(handle_search_by_subregion))
        .route("/postal-codes/regions", get(handle_list_regions))
        .route(
            "/postal-codes/regions/:region/subregions",
            get(handle_list_subregions),
        )
        .route("/postal-codes/stats", get(handle_stats))
        .route("/postal-codes/:code", get(handle_get_by_code))
        .route("/postal-codes/:code/settlements", get(handle_get_settlements))
        .layer(middleware::from_fn_with_state(
            limiter.clone(),
            rate_limit_middleware,
        ));

    let app = Router::new()
        .merge(query_routes)
        .route("/health", get(handle_health))
        .layer(Extension(catalog));

    // 3. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
