use std::{net::SocketAddr, sync::Arc};

use yieldboard::{
    cache_ttl_from_env, dashboard_router, demo_snapshot, init_logging, log_app_bind,
    log_app_start, log_demo_source_selected, log_live_source_selected, logging_config_from_env,
    CachedSheetSource, InMemorySnapshotSource, OfferSource, SheetConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start(&logging_cfg);

    let addr: SocketAddr = std::env::var("YIELDBOARD_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let source: Arc<dyn OfferSource> = source_from_env();
    let app = dashboard_router(source);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn source_from_env() -> Arc<dyn OfferSource> {
    let force_demo = std::env::var("YIELDBOARD_USE_DEMO")
        .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if force_demo {
        log_demo_source_selected();
        return Arc::new(InMemorySnapshotSource::new(demo_snapshot()));
    }

    let sheet_cfg = SheetConfig::from_env();
    let cache_ttl = cache_ttl_from_env();
    log_live_source_selected(&sheet_cfg.sheet_url, cache_ttl.as_secs());
    Arc::new(CachedSheetSource::new(sheet_cfg, cache_ttl))
}
