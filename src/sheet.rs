//! Offer ingestion from the publicly shared spreadsheet CSV export.
//!
//! One fetch produces one immutable [`OfferSnapshot`]. Header resolution runs
//! once per snapshot: exact candidate names first, then a substring fallback
//! over the actual headers. Sentinel "no value" strings are scrubbed to `None`
//! at this boundary so nothing downstream ever sees them.

use chrono::DateTime;
use chrono_tz::Tz;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::timeparse::{
    self, non_sentinel, parse_duration_days, parse_time_at, TimeField,
};

/// The shared sheet this dashboard was built around.
pub const DEFAULT_SHEET_ID: &str = "1UnFhhgjKTTKI0j4TbmyxyfAlE-DuAwICM-J9NrAmHD4";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub sheet_url: String,
    pub http_timeout_ms: u64,
}

impl SheetConfig {
    pub fn for_sheet_id(sheet_id: &str) -> Self {
        Self {
            sheet_url: format!(
                "https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv"
            ),
            http_timeout_ms: 10_000,
        }
    }

    /// `YIELDBOARD_SHEET_URL` overrides the whole URL; otherwise
    /// `YIELDBOARD_SHEET_ID` selects the sheet to export.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("YIELDBOARD_SHEET_ID") {
            Ok(id) if !id.trim().is_empty() => Self::for_sheet_id(id.trim()),
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("YIELDBOARD_SHEET_URL") {
            if !url.trim().is_empty() {
                config.sheet_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var("YIELDBOARD_HTTP_TIMEOUT_MS") {
            if let Ok(timeout_ms) = raw.trim().parse() {
                config.http_timeout_ms = timeout_ms;
            }
        }

        config
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self::for_sheet_id(DEFAULT_SHEET_ID)
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("HTTP client build error: {0}")]
    HttpClientBuild(String),
    #[error("HTTP request failed for {url}: {message}")]
    HttpRequest { url: String, message: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column missing: {0}")]
    MissingColumn(&'static str),
}

/// One yield-bearing product row. Optional fields were either absent in the
/// sheet or held a null sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub coin: String,
    pub platform: String,
    /// APY exactly as the sheet spells it, e.g. "12.5%".
    pub apy_raw: String,
    /// Parsed non-negative percentage; `None` when the raw string is
    /// unparseable (the row stays visible but never wins the headline).
    pub apy_value: Option<f64>,
    pub end_raw: Option<String>,
    pub end_ts: Option<i64>,
    pub start_ts: Option<i64>,
    pub payout_time: Option<String>,
    pub account_limit: Option<String>,
    pub lock_status: Option<String>,
    pub projected_income: Option<String>,
    pub link: Option<String>,
}

/// Immutable result of one sheet read. Never mutated after construction;
/// each cache refresh replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferSnapshot {
    pub offers: Vec<Offer>,
    pub fetched_at_ts: i64,
}

/// Strips a trailing percent sign and parses a non-negative percentage.
pub fn parse_apy(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let value = numeric.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

pub fn fetch_snapshot(config: &SheetConfig) -> Result<OfferSnapshot, SheetError> {
    let fetcher = ReqwestBlockingFetcher::new(config.http_timeout_ms)?;
    fetch_snapshot_with_fetcher(config, &fetcher)
}

fn fetch_snapshot_with_fetcher(
    config: &SheetConfig,
    fetcher: &dyn HttpFetcher,
) -> Result<OfferSnapshot, SheetError> {
    info!(
        component = "sheet",
        event = "sheet.fetch.start",
        url = %config.sheet_url
    );

    let body = fetcher.get_text(&config.sheet_url)?;
    let snapshot = parse_snapshot(body.as_bytes(), timeparse::now_in_operating_tz())?;

    info!(
        component = "sheet",
        event = "sheet.fetch.finish",
        rows = snapshot.offers.len()
    );
    Ok(snapshot)
}

/// Parses a CSV export relative to an explicit `now` (year inference and the
/// snapshot timestamp both depend on it).
pub fn parse_snapshot(csv_bytes: &[u8], now: DateTime<Tz>) -> Result<OfferSnapshot, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_bytes);

    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut offers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(offer) = offer_from_record(&record, &columns, now) {
            offers.push(offer);
        }
    }

    Ok(OfferSnapshot {
        offers,
        fetched_at_ts: now.timestamp(),
    })
}

/// Header indices resolved once per snapshot. Only coin/platform/APY are
/// required; every other column degrades to absent fields when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    platform: usize,
    coin: usize,
    apy: usize,
    end_time: Option<usize>,
    start_time: Option<usize>,
    payout_time: Option<usize>,
    account_limit: Option<usize>,
    lock_status: Option<usize>,
    projected_income: Option<usize>,
    link: Option<usize>,
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, SheetError> {
    let platform = resolve_column(headers, &["平台", "platform"], |h| h.contains("平台"))
        .ok_or(SheetError::MissingColumn("平台"))?;
    let coin = resolve_column(headers, &["币种", "coin"], |h| h.contains("币种"))
        .ok_or(SheetError::MissingColumn("币种"))?;
    let apy = resolve_column(headers, &["年化（APY）", "年化(APY)", "APY"], |h| {
        h.to_ascii_lowercase().contains("apy") || h.contains("年化")
    })
    .ok_or(SheetError::MissingColumn("年化（APY）"))?;

    Ok(ColumnMap {
        platform,
        coin,
        apy,
        end_time: resolve_column(headers, &["结束时间"], |h| {
            h.contains("结束") || h.contains("截止")
        }),
        start_time: resolve_column(
            headers,
            &["开始时间", "起始时间", "上线时间", "start time"],
            is_start_time_header,
        ),
        payout_time: resolve_column(headers, &["派息时间"], |h| h.contains("派息")),
        account_limit: resolve_column(headers, &["单个账户限额"], |h| {
            h.contains("限额") || h.to_ascii_lowercase().contains("limit")
        }),
        lock_status: resolve_column(headers, &["是否锁仓"], |h| {
            h.contains("锁仓") || h.to_ascii_lowercase().contains("lock")
        }),
        projected_income: resolve_column(headers, &["投入1wu一个月收益"], |h| {
            h.contains("收益")
        }),
        link: resolve_column(headers, &["理财链接"], |h| {
            h.contains("链接") || h.to_ascii_lowercase().contains("link")
        }),
    })
}

/// Exact candidates win in priority order; the predicate scan over actual
/// headers is the fallback.
fn resolve_column(
    headers: &StringRecord,
    candidates: &[&str],
    fallback: impl Fn(&str) -> bool,
) -> Option<usize> {
    for candidate in candidates {
        if let Some(idx) = headers.iter().position(|h| h.trim() == *candidate) {
            return Some(idx);
        }
    }
    headers.iter().position(|h| fallback(h.trim()))
}

fn is_start_time_header(header: &str) -> bool {
    let lower = header.to_ascii_lowercase();
    let mentions_start =
        lower.contains("start") || header.contains("开始") || header.contains("起始");
    let mentions_time = lower.contains("time")
        || lower.contains("date")
        || header.contains("时间")
        || header.contains("日期");
    mentions_start && mentions_time
}

fn offer_from_record(
    record: &StringRecord,
    columns: &ColumnMap,
    now: DateTime<Tz>,
) -> Option<Offer> {
    let coin = optional_field(record, Some(columns.coin));
    let platform = optional_field(record, Some(columns.platform));
    if coin.is_none() && platform.is_none() {
        // Blank filler row.
        return None;
    }
    let coin = coin.unwrap_or_default();
    let platform = platform.unwrap_or_default();

    let apy_raw = optional_field(record, Some(columns.apy)).unwrap_or_else(|| "-".to_string());
    let apy_value = parse_apy(&apy_raw);
    if apy_value.is_none() {
        warn!(
            component = "sheet",
            event = "sheet.row.apy_unparseable",
            coin = %coin,
            platform = %platform,
            apy = %apy_raw
        );
    }

    let start_raw = optional_field(record, columns.start_time);
    let start_ts = start_raw
        .as_deref()
        .and_then(|raw| parse_time_at(raw, TimeField::Start, now))
        .map(|dt| dt.timestamp());

    let end_raw = optional_field(record, columns.end_time);
    let end_ts = end_raw.as_deref().and_then(|raw| {
        // "N天" with a known start means start + N days, not a date.
        match (parse_duration_days(raw), start_ts) {
            (Some(days), Some(start)) => Some(start + days * SECONDS_PER_DAY),
            _ => parse_time_at(raw, TimeField::End, now).map(|dt| dt.timestamp()),
        }
    });

    Some(Offer {
        coin,
        platform,
        apy_raw,
        apy_value,
        end_raw,
        end_ts,
        start_ts,
        payout_time: optional_field(record, columns.payout_time),
        account_limit: optional_field(record, columns.account_limit),
        lock_status: optional_field(record, columns.lock_status),
        projected_income: optional_field(record, columns.projected_income),
        link: optional_field(record, columns.link),
    })
}

fn optional_field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|idx| record.get(idx)).and_then(non_sentinel)
}

trait HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String, SheetError>;
}

struct ReqwestBlockingFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestBlockingFetcher {
    fn new(timeout_ms: u64) -> Result<Self, SheetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| SheetError::HttpClientBuild(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpFetcher for ReqwestBlockingFetcher {
    fn get_text(&self, url: &str) -> Result<String, SheetError> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| SheetError::HttpRequest {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        response.text().map_err(|err| SheetError::HttpRequest {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeparse::OPERATING_TZ;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Tz> {
        OPERATING_TZ
            .with_ymd_and_hms(2025, 12, 20, 12, 0, 0)
            .single()
            .expect("valid operating-zone datetime expected")
    }

    const FULL_HEADER: &str =
        "平台,币种,年化（APY）,结束时间,开始时间,派息时间,单个账户限额,是否锁仓,投入1wu一个月收益,理财链接";

    #[test]
    fn parses_full_row() {
        let csv = format!(
            "{FULL_HEADER}\n\
             Binance,USDT,12.5%,2026-01-24 07:59,2025-12-01,每日,限额5000U,不锁仓,约100U,https://example.com/usdt"
        );

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        assert_eq!(snapshot.offers.len(), 1);

        let offer = &snapshot.offers[0];
        assert_eq!(offer.platform, "Binance");
        assert_eq!(offer.coin, "USDT");
        assert_eq!(offer.apy_raw, "12.5%");
        assert_eq!(offer.apy_value, Some(12.5));
        assert_eq!(offer.payout_time.as_deref(), Some("每日"));
        assert_eq!(offer.account_limit.as_deref(), Some("限额5000U"));
        assert_eq!(offer.lock_status.as_deref(), Some("不锁仓"));
        assert_eq!(offer.link.as_deref(), Some("https://example.com/usdt"));

        let start = OPERATING_TZ
            .with_ymd_and_hms(2025, 12, 1, 0, 0, 0)
            .single()
            .map(|dt| dt.timestamp());
        assert_eq!(offer.start_ts, start);

        let end = OPERATING_TZ
            .with_ymd_and_hms(2026, 1, 24, 7, 59, 0)
            .single()
            .map(|dt| dt.timestamp());
        assert_eq!(offer.end_ts, end);
    }

    #[test]
    fn sentinels_become_absent_fields() {
        let csv = format!(
            "{FULL_HEADER}\n\
             OKX,USDC,8%,暂无,无,-,无,无,暂无,无"
        );

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        let offer = &snapshot.offers[0];

        assert_eq!(offer.end_ts, None);
        assert_eq!(offer.end_raw, None);
        assert_eq!(offer.start_ts, None);
        assert_eq!(offer.payout_time, None);
        assert_eq!(offer.account_limit, None);
        assert_eq!(offer.lock_status, None);
        assert_eq!(offer.projected_income, None);
        assert_eq!(offer.link, None);
    }

    #[test]
    fn unparseable_apy_keeps_row_without_value() {
        let csv = format!(
            "{FULL_HEADER}\n\
             Bybit,FDUSD,浮动,1月24日,-,-,-,-,-,-"
        );

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        let offer = &snapshot.offers[0];

        assert_eq!(offer.apy_raw, "浮动");
        assert_eq!(offer.apy_value, None);
        assert!(offer.end_ts.is_some());
    }

    #[test]
    fn duration_days_end_resolves_against_start() {
        let csv = format!(
            "{FULL_HEADER}\n\
             Gate,USDT,9%,30天,2025-12-10,-,-,-,-,-"
        );

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        let offer = &snapshot.offers[0];

        let start = offer.start_ts.expect("start expected");
        assert_eq!(offer.end_ts, Some(start + 30 * SECONDS_PER_DAY));
    }

    #[test]
    fn duration_days_without_start_is_unparseable_end() {
        let csv = format!(
            "{FULL_HEADER}\n\
             Gate,USDT,9%,30天,-,-,-,-,-,-"
        );

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        assert_eq!(snapshot.offers[0].end_ts, None);
    }

    #[test]
    fn start_column_is_fuzzy_matched() {
        let csv = "平台,币种,年化（APY）,活动开始日期\n\
                   Binance,USDT,5%,2025-12-01";

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        assert!(snapshot.offers[0].start_ts.is_some());
    }

    #[test]
    fn missing_apy_column_is_an_error() {
        let csv = "平台,币种,结束时间\nBinance,USDT,2026-01-24";

        let err = parse_snapshot(csv.as_bytes(), fixed_now()).expect_err("error expected");
        assert!(matches!(err, SheetError::MissingColumn(_)));
    }

    #[test]
    fn missing_optional_columns_degrade_to_absent() {
        let csv = "平台,币种,APY\nBinance,USDT,5%";

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        let offer = &snapshot.offers[0];

        assert_eq!(offer.apy_value, Some(5.0));
        assert_eq!(offer.end_ts, None);
        assert_eq!(offer.account_limit, None);
        assert_eq!(offer.link, None);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let csv = "平台,币种,APY\nBinance,USDT,5%\n,,";

        let snapshot = parse_snapshot(csv.as_bytes(), fixed_now()).expect("snapshot expected");
        assert_eq!(snapshot.offers.len(), 1);
    }

    #[test]
    fn apy_strings_parse_and_reject() {
        assert_eq!(parse_apy("12.5%"), Some(12.5));
        assert_eq!(parse_apy(" 8 % "), Some(8.0));
        assert_eq!(parse_apy("0%"), Some(0.0));
        assert_eq!(parse_apy("-3%"), None);
        assert_eq!(parse_apy("浮动"), None);
        assert_eq!(parse_apy(""), None);
    }

    #[test]
    fn stub_fetcher_feeds_full_pipeline() {
        struct StubFetcher(String);
        impl HttpFetcher for StubFetcher {
            fn get_text(&self, _url: &str) -> Result<String, SheetError> {
                Ok(self.0.clone())
            }
        }

        let config = SheetConfig::default();
        let fetcher = StubFetcher(format!(
            "{FULL_HEADER}\n\
             Binance,USDT,12.5%,2026-01-24,-,-,-,-,-,-"
        ));

        let snapshot =
            fetch_snapshot_with_fetcher(&config, &fetcher).expect("snapshot expected");
        assert_eq!(snapshot.offers.len(), 1);
        assert_eq!(snapshot.offers[0].apy_value, Some(12.5));
    }

    #[test]
    fn default_config_builds_export_url() {
        let config = SheetConfig::default();
        assert!(config.sheet_url.contains(DEFAULT_SHEET_ID));
        assert!(config.sheet_url.ends_with("export?format=csv"));
    }
}
