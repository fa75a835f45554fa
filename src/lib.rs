//! Yieldboard core crate.
//!
//! Read-only dashboard over a publicly shared spreadsheet of stablecoin
//! yield offers:
//! - sheet CSV ingestion with sentinel scrubbing and fuzzy header resolution
//! - free-text time parsing into the fixed operating zone
//! - countdown labels and elapsed-progress computation
//! - single-slot time-boxed snapshot cache
//! - HTML/JSON rendering with a live-ticking countdown and profit calculator

mod cache;
mod dashboard;
mod interval;
mod observability;
mod sheet;
mod timeparse;

pub use cache::{
    cache_ttl_from_env, CachedSheetSource, InMemorySnapshotSource, OfferSource, SnapshotCache,
    DEFAULT_CACHE_TTL_SECS,
};
pub use dashboard::{
    best_offer_index, build_display_snapshot, dashboard_router, demo_snapshot, profit_estimates,
    render_dashboard_html, render_error_html, BestOffer, DisplayRow, DisplaySnapshot, DisplayTag,
    ProfitEstimates, FETCH_ERROR_NOTICE, PAGE_TITLE, TABLE_HEADERS,
};
pub use interval::{compute_countdown, Countdown, DEFAULT_LOOKBACK_DAYS, ENDED_LABEL};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_demo_source_selected,
    log_live_source_selected, logging_config_from_env, LogFormat, LoggingConfig, LoggingInitError,
};
pub use sheet::{
    fetch_snapshot, parse_apy, parse_snapshot, Offer, OfferSnapshot, SheetConfig, SheetError,
    DEFAULT_SHEET_ID,
};
pub use timeparse::{
    is_null_sentinel, non_sentinel, now_in_operating_tz, parse_duration_days, parse_time,
    parse_time_at, TimeField, NULL_SENTINELS, OPERATING_TZ,
};
