//! Offer table rendering and HTTP routes.
//!
//! One display pass maps an [`OfferSnapshot`] to display rows plus the single
//! highest-APY highlight, renders the HTML page (table, countdown cells,
//! profit-calculator modal, 1 s ticking script), and exposes the same display
//! data as JSON on `/snapshot`. Rendering never mutates the input snapshot.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::cache::OfferSource;
use crate::interval::{compute_countdown, Countdown};
use crate::sheet::{Offer, OfferSnapshot};
use crate::timeparse::{now_in_operating_tz, OPERATING_TZ};

pub const PAGE_TITLE: &str = "稳定币理财实时看板";

/// Shown when the sheet cannot be fetched or minimally parsed at all.
pub const FETCH_ERROR_NOTICE: &str =
    "数据加载失败，请确保 Google 表格已开启「知道链接的任何人可查看」权限。";

pub const TABLE_HEADERS: [&str; 6] = [
    "币种",
    "年化（APY）",
    "结束时间",
    "标签",
    "预计收益",
    "操作",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub generated_at_ts: i64,
    pub best: Option<BestOffer>,
    pub rows: Vec<DisplayRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOffer {
    pub index: usize,
    pub platform: String,
    pub apy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub coin: String,
    pub platform: String,
    pub apy: String,
    pub apy_value: Option<f64>,
    pub countdown: Countdown,
    pub end_label: String,
    pub tags: Vec<DisplayTag>,
    pub projected_income: Option<String>,
    pub link: Option<String>,
    pub is_best: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTag {
    pub text: String,
    /// CSS hook: "limit", "lock" or "payout".
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitEstimates {
    pub daily: f64,
    pub monthly: f64,
    pub yearly: f64,
}

/// Simple proportional estimate: yearly = principal × APY, monthly = /12,
/// daily = /365. No compounding, no fee model.
pub fn profit_estimates(principal: f64, apy_pct: f64) -> ProfitEstimates {
    let yearly = principal * apy_pct / 100.0;
    ProfitEstimates {
        daily: yearly / 365.0,
        monthly: yearly / 12.0,
        yearly,
    }
}

/// Index of the offer with the maximum parsed APY. Ties keep the first
/// occurrence; rows without a parseable APY never win.
pub fn best_offer_index(offers: &[Offer]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (idx, offer) in offers.iter().enumerate() {
        let Some(value) = offer.apy_value else {
            continue;
        };
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((idx, value));
        }
    }

    best.map(|(idx, _)| idx)
}

pub fn build_display_snapshot(snapshot: &OfferSnapshot, now_ts: i64) -> DisplaySnapshot {
    let best_idx = best_offer_index(&snapshot.offers);

    let rows = snapshot
        .offers
        .iter()
        .enumerate()
        .map(|(idx, offer)| display_row(offer, best_idx == Some(idx), now_ts))
        .collect();

    let best = best_idx.map(|idx| {
        let offer = &snapshot.offers[idx];
        BestOffer {
            index: idx,
            platform: offer.platform.clone(),
            apy: offer.apy_raw.clone(),
        }
    });

    DisplaySnapshot {
        generated_at_ts: now_ts,
        best,
        rows,
    }
}

fn display_row(offer: &Offer, is_best: bool, now_ts: i64) -> DisplayRow {
    let mut tags = Vec::new();
    if let Some(limit) = &offer.account_limit {
        tags.push(DisplayTag {
            text: limit.clone(),
            kind: "limit".to_string(),
        });
    }
    if let Some(lock) = &offer.lock_status {
        tags.push(DisplayTag {
            text: lock.clone(),
            kind: "lock".to_string(),
        });
    }
    if let Some(payout) = &offer.payout_time {
        tags.push(DisplayTag {
            text: payout.clone(),
            kind: "payout".to_string(),
        });
    }

    // An unparseable APY degrades the field to "-"; the row itself stays.
    let apy = if offer.apy_value.is_some() {
        offer.apy_raw.clone()
    } else {
        "-".to_string()
    };

    DisplayRow {
        coin: offer.coin.clone(),
        platform: offer.platform.clone(),
        apy,
        apy_value: offer.apy_value,
        countdown: compute_countdown(offer.start_ts, offer.end_ts, now_ts),
        end_label: offer.end_raw.clone().unwrap_or_else(|| "-".to_string()),
        tags,
        projected_income: offer.projected_income.clone(),
        link: offer.link.clone(),
        is_best,
    }
}

/// Fixed offers for demo mode; windows are placed relative to now so the
/// countdown and progress bar have something to do.
pub fn demo_snapshot() -> OfferSnapshot {
    let now_ts = now_in_operating_tz().timestamp();
    const DAY: i64 = 24 * 3600;

    let offer = |coin: &str,
                 platform: &str,
                 apy_raw: &str,
                 start_ts: Option<i64>,
                 end_ts: Option<i64>,
                 limit: Option<&str>,
                 lock: Option<&str>| Offer {
        coin: coin.to_string(),
        platform: platform.to_string(),
        apy_raw: apy_raw.to_string(),
        apy_value: crate::sheet::parse_apy(apy_raw),
        end_raw: end_ts.map(|_| "演示数据".to_string()),
        end_ts,
        start_ts,
        payout_time: Some("每日".to_string()),
        account_limit: limit.map(str::to_string),
        lock_status: lock.map(str::to_string),
        projected_income: None,
        link: Some("https://example.com/offer".to_string()),
    };

    OfferSnapshot {
        offers: vec![
            offer(
                "USDT",
                "Binance",
                "12.5%",
                Some(now_ts - 10 * DAY),
                Some(now_ts + 5 * DAY),
                Some("限额5000U"),
                Some("不锁仓"),
            ),
            offer(
                "USDC",
                "OKX",
                "8%",
                None,
                Some(now_ts + 20 * DAY),
                None,
                Some("锁仓7天"),
            ),
            offer("FDUSD", "Bybit", "6.8%", None, None, Some("限额1000U"), None),
        ],
        fetched_at_ts: now_ts,
    }
}

pub fn dashboard_router(source: Arc<dyn OfferSource>) -> Router {
    Router::new()
        .route("/", get(get_dashboard_html))
        .route("/snapshot", get(get_display_snapshot))
        .with_state(DashboardAppState { source })
}

pub fn render_dashboard_html(snapshot: &DisplaySnapshot) -> String {
    let generated = OPERATING_TZ
        .timestamp_opt(snapshot.generated_at_ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html lang=\"zh-CN\"><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{PAGE_TITLE}</title>\n"));
    out.push_str(PAGE_STYLE);
    out.push_str("</head><body><main class=\"shell\">\n");
    out.push_str("<h1>💰 稳定币理财收益看板</h1>\n");
    out.push_str(&format!(
        "<div class=\"page-meta\">更新时间 {}</div>\n",
        escape_html(&generated)
    ));

    if let Some(best) = &snapshot.best {
        out.push_str("<section class=\"metric\"><div class=\"metric-label\">🔥 当前最高收益 (");
        out.push_str(&escape_html(&best.platform));
        out.push_str(")</div><div class=\"metric-value\">");
        out.push_str(&escape_html(&best.apy));
        out.push_str("</div></section>\n");
    }

    out.push_str("<table class=\"alpha-table\"><thead><tr>");
    for header in TABLE_HEADERS {
        out.push_str("<th>");
        out.push_str(&escape_html(header));
        out.push_str("</th>");
    }
    out.push_str("</tr></thead><tbody>\n");

    for row in &snapshot.rows {
        out.push_str(&render_row(row));
    }

    out.push_str("</tbody></table>\n");
    out.push_str(CALC_MODAL);
    out.push_str(PAGE_SCRIPT);
    out.push_str("</main></body></html>\n");
    out
}

fn render_row(row: &DisplayRow) -> String {
    let mut out = String::new();
    out.push_str("<tr>");

    out.push_str("<td class=\"coin-cell\">");
    out.push_str(&escape_html(&row.coin));
    out.push_str("<div class=\"sub-text\">");
    out.push_str(&escape_html(&row.platform));
    out.push_str("</div></td>");

    let apy_class = if row.is_best {
        "highlight best-apy"
    } else {
        "highlight"
    };
    out.push_str(&format!("<td class=\"{apy_class}\"><div class=\"apy\">"));
    out.push_str(&escape_html(&row.apy));
    out.push_str("</div>");
    if let (Some(start), Some(end)) = (row.countdown.start_ts, row.countdown.end_ts) {
        let label = row.countdown.label.as_deref().unwrap_or("-");
        let progress = row.countdown.progress.unwrap_or(0.0);
        out.push_str(&format!(
            "<div class=\"countdown\" data-start=\"{start}\" data-end=\"{end}\">"
        ));
        out.push_str("<span class=\"remain\">");
        out.push_str(&escape_html(label));
        out.push_str("</span><div class=\"progress\"><div class=\"progress-fill\" style=\"width:");
        out.push_str(&format!("{progress:.1}"));
        out.push_str("%\"></div></div></div>");
    }
    out.push_str("</td>");

    out.push_str("<td>");
    out.push_str(&escape_html(&row.end_label));
    out.push_str("</td>");

    out.push_str("<td>");
    if row.tags.is_empty() {
        out.push_str("-");
    } else {
        for tag in &row.tags {
            out.push_str(&format!(
                "<span class=\"tag tag-{}\">",
                escape_html(&tag.kind)
            ));
            out.push_str(&escape_html(&tag.text));
            out.push_str("</span>");
        }
    }
    out.push_str("</td>");

    out.push_str("<td>");
    out.push_str(&escape_html(row.projected_income.as_deref().unwrap_or("-")));
    out.push_str("</td>");

    out.push_str("<td class=\"action-cell\">");
    if let Some(apy_value) = row.apy_value {
        out.push_str(&format!(
            "<button class=\"calc-btn\" data-apy=\"{apy_value}\" data-title=\"{}\">计算收益</button>",
            escape_html(&row.coin)
        ));
    }
    if let Some(link) = &row.link {
        out.push_str("<a class=\"go-btn\" target=\"_blank\" rel=\"noopener noreferrer\" href=\"");
        out.push_str(&escape_html(link));
        out.push_str("\">前往 →</a>");
    }
    out.push_str("</td>");

    out.push_str("</tr>\n");
    out
}

/// Blocking page-level notice; only the table region is at stake, so the
/// page keeps its chrome and swaps the table for the notice.
pub fn render_error_html(detail: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html lang=\"zh-CN\"><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{PAGE_TITLE}</title>\n"));
    out.push_str(PAGE_STYLE);
    out.push_str("</head><body><main class=\"shell\">\n");
    out.push_str("<h1>💰 稳定币理财收益看板</h1>\n");
    out.push_str("<section class=\"error-notice\"><p>");
    out.push_str(&escape_html(FETCH_ERROR_NOTICE));
    out.push_str("</p><p class=\"error-detail\">");
    out.push_str(&escape_html(detail));
    out.push_str("</p></section>\n");
    out.push_str("</main></body></html>\n");
    out
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Clone)]
struct DashboardAppState {
    source: Arc<dyn OfferSource>,
}

async fn get_dashboard_html(State(state): State<DashboardAppState>) -> Html<String> {
    match load_display_snapshot(state).await {
        Ok(display) => Html(render_dashboard_html(&display)),
        Err(detail) => Html(render_error_html(&detail)),
    }
}

async fn get_display_snapshot(State(state): State<DashboardAppState>) -> Response {
    match load_display_snapshot(state).await {
        Ok(display) => Json(display).into_response(),
        Err(detail) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": detail })),
        )
            .into_response(),
    }
}

async fn load_display_snapshot(state: DashboardAppState) -> Result<DisplaySnapshot, String> {
    let source = state.source.clone();
    // The sheet fetch is blocking reqwest; keep it off the async workers.
    let snapshot = tokio::task::spawn_blocking(move || source.snapshot())
        .await
        .map_err(|err| err.to_string())?
        .map_err(|err| err.to_string())?;

    Ok(build_display_snapshot(
        &snapshot,
        now_in_operating_tz().timestamp(),
    ))
}

const PAGE_STYLE: &str = "<style>\
*{box-sizing:border-box}\
body{margin:0;background:#f7f8fa;color:#333;font-family:\"PingFang SC\",\"Microsoft YaHei\",\"Segoe UI\",sans-serif}\
.shell{max-width:1100px;margin:0 auto;padding:24px 16px}\
h1{font-size:1.5rem;margin:0 0 4px}\
.page-meta{color:#999;font-size:13px;margin-bottom:16px}\
.metric{background:#fff;border:1px solid #e0e0e0;border-radius:10px;padding:14px 20px;margin-bottom:16px;display:inline-block}\
.metric-label{color:#888;font-size:13px}\
.metric-value{color:#d4a017;font-size:1.6rem;font-weight:600;margin-top:4px}\
.alpha-table{width:100%;border-collapse:collapse;background:#fff;font-size:15px}\
.alpha-table th{background:#fafafa;color:#888;font-weight:normal;padding:14px 20px;text-align:center;border-bottom:1px solid #e0e0e0;font-size:14px}\
.alpha-table td{color:#333;padding:16px 20px;border-bottom:1px solid #eee;vertical-align:middle;text-align:center}\
.alpha-table tr:last-child td{border-bottom:none}\
.alpha-table tr:hover td{background:#e6f7ff}\
.coin-cell{text-align:left;font-weight:600;color:#222}\
.sub-text{font-size:13px;color:#999;margin-top:4px;font-weight:normal}\
.highlight{color:#d4a017;font-weight:600}\
.best-apy .apy::after{content:\" 🔥\"}\
.countdown{margin-top:6px}\
.remain{font-size:12px;color:#666;font-weight:normal}\
.progress{height:4px;background:#f0f0f0;border-radius:2px;margin-top:4px;overflow:hidden}\
.progress-fill{height:100%;background:#1890ff;border-radius:2px}\
.tag{display:inline-block;background:#f0f0f0;border-radius:12px;padding:4px 10px;font-size:12px;color:#666;margin:2px}\
.tag-limit{background:#fff1f0;color:#cf1322}\
.tag-lock{background:#e6f7ff;color:#1890ff}\
.go-btn{color:#1890ff;text-decoration:none;font-size:14px;margin-left:8px}\
.go-btn:hover{text-decoration:underline}\
.calc-btn{background:#fff;border:1px solid #1890ff;color:#1890ff;border-radius:6px;padding:4px 10px;font-size:13px;cursor:pointer}\
.calc-btn:hover{background:#e6f7ff}\
.action-cell{white-space:nowrap}\
.error-notice{background:#fff1f0;border:1px solid #ffa39e;border-radius:10px;padding:18px 22px;color:#cf1322}\
.error-detail{color:#999;font-size:13px}\
.modal-mask{position:fixed;inset:0;background:rgba(0,0,0,.45);display:flex;align-items:center;justify-content:center}\
.modal-mask[hidden]{display:none}\
.modal{background:#fff;border-radius:12px;padding:22px 26px;min-width:300px}\
.modal h3{margin:0 0 12px}\
.modal input{width:100%;padding:8px 10px;border:1px solid #d9d9d9;border-radius:6px;font-size:15px}\
.calc-results{margin:14px 0;color:#666;font-size:14px;line-height:1.9}\
.calc-results b{color:#d4a017;float:right}\
#calc-close{background:#f0f0f0;border:none;border-radius:6px;padding:6px 14px;cursor:pointer}\
</style>\n";

const CALC_MODAL: &str = "\
<div id=\"calc-modal\" class=\"modal-mask\" hidden>\
<div class=\"modal\">\
<h3 id=\"calc-title\"></h3>\
<input id=\"calc-principal\" type=\"number\" min=\"0\" placeholder=\"输入本金 (U)\">\
<div class=\"calc-results\">\
<div>日收益<b id=\"calc-daily\">-</b></div>\
<div>月收益<b id=\"calc-monthly\">-</b></div>\
<div>年收益<b id=\"calc-yearly\">-</b></div>\
</div>\
<button id=\"calc-close\">关闭</button>\
</div></div>\n";

// The tick formulas must match compute_countdown exactly; a reload lands on
// the server-rendered values and the first tick must not jump.
const PAGE_SCRIPT: &str = "<script>\n\
const ENDED='已结束';\n\
function fmtRemaining(sec){\n\
  const d=Math.floor(sec/86400);\n\
  const h=Math.floor((sec%86400)/3600);\n\
  return d>=1?d+'天'+h+'小时':h+'小时';\n\
}\n\
function tick(){\n\
  const now=Math.floor(Date.now()/1000);\n\
  document.querySelectorAll('.countdown').forEach(function(el){\n\
    const start=parseInt(el.dataset.start,10);\n\
    const end=parseInt(el.dataset.end,10);\n\
    let label,progress;\n\
    if(end<=now){label=ENDED;progress=100;}\n\
    else{\n\
      label=fmtRemaining(end-now);\n\
      const dur=Math.max(end-start,1);\n\
      progress=Math.min(Math.max((now-start)/dur*100,0),100);\n\
    }\n\
    el.querySelector('.remain').textContent=label;\n\
    el.querySelector('.progress-fill').style.width=progress+'%';\n\
  });\n\
}\n\
setInterval(tick, 1000);\n\
tick();\n\
let currentApy=0;\n\
const mask=document.getElementById('calc-modal');\n\
const principalEl=document.getElementById('calc-principal');\n\
function recalc(){\n\
  const principal=parseFloat(principalEl.value)||0;\n\
  const yearly=principal*currentApy/100;\n\
  document.getElementById('calc-daily').textContent=(yearly/365).toFixed(2)+' U';\n\
  document.getElementById('calc-monthly').textContent=(yearly/12).toFixed(2)+' U';\n\
  document.getElementById('calc-yearly').textContent=yearly.toFixed(2)+' U';\n\
}\n\
document.querySelectorAll('.calc-btn').forEach(function(btn){\n\
  btn.addEventListener('click',function(){\n\
    currentApy=parseFloat(btn.dataset.apy);\n\
    document.getElementById('calc-title').textContent=btn.dataset.title+' 收益计算';\n\
    mask.hidden=false;\n\
    recalc();\n\
  });\n\
});\n\
document.getElementById('calc-close').addEventListener('click',function(){mask.hidden=true;});\n\
principalEl.addEventListener('input',recalc);\n\
</script>\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::ENDED_LABEL;

    fn offer(coin: &str, platform: &str, apy_raw: &str, apy_value: Option<f64>) -> Offer {
        Offer {
            coin: coin.to_string(),
            platform: platform.to_string(),
            apy_raw: apy_raw.to_string(),
            apy_value,
            end_raw: None,
            end_ts: None,
            start_ts: None,
            payout_time: None,
            account_limit: None,
            lock_status: None,
            projected_income: None,
            link: None,
        }
    }

    #[test]
    fn profit_estimates_match_reference_values() {
        let est = profit_estimates(10_000.0, 5.0);
        assert!((est.yearly - 500.0).abs() < 1e-9);
        assert!((est.monthly - 41.666_67).abs() < 1e-4);
        assert!((est.daily - 1.369_86).abs() < 1e-4);
    }

    #[test]
    fn best_offer_is_maximum_apy() {
        let offers = vec![
            offer("USDT", "Binance", "8%", Some(8.0)),
            offer("USDC", "OKX", "12.5%", Some(12.5)),
            offer("FDUSD", "Bybit", "10%", Some(10.0)),
        ];
        assert_eq!(best_offer_index(&offers), Some(1));
    }

    #[test]
    fn best_offer_ties_break_to_first_occurrence() {
        let offers = vec![
            offer("USDT", "Binance", "12.5%", Some(12.5)),
            offer("USDC", "OKX", "12.5%", Some(12.5)),
        ];
        assert_eq!(best_offer_index(&offers), Some(0));
    }

    #[test]
    fn unparseable_apy_never_wins() {
        let offers = vec![
            offer("USDT", "Binance", "浮动", None),
            offer("USDC", "OKX", "3%", Some(3.0)),
        ];
        assert_eq!(best_offer_index(&offers), Some(1));

        let all_unparseable = vec![offer("USDT", "Binance", "浮动", None)];
        assert_eq!(best_offer_index(&all_unparseable), None);
    }

    #[test]
    fn unparseable_apy_cell_degrades_to_dash() {
        let snapshot = OfferSnapshot {
            offers: vec![
                offer("USDT", "Binance", "浮动", None),
                offer("USDC", "OKX", "8%", Some(8.0)),
            ],
            fetched_at_ts: 0,
        };

        let display = build_display_snapshot(&snapshot, 1_000);
        assert_eq!(display.rows[0].apy, "-");
        assert_eq!(display.rows[1].apy, "8%");

        // The raw text never reaches the page, and a "-" cell gets no
        // calculator button.
        let html = render_dashboard_html(&display);
        assert!(!html.contains("浮动"));
        assert_eq!(html.matches("<button class=\"calc-btn\"").count(), 1);
    }

    #[test]
    fn display_snapshot_carries_headline_and_tags() {
        let mut limited = offer("USDT", "Binance", "12.5%", Some(12.5));
        limited.account_limit = Some("限额5000U".to_string());
        limited.lock_status = Some("不锁仓".to_string());

        let snapshot = OfferSnapshot {
            offers: vec![limited, offer("USDC", "OKX", "8%", Some(8.0))],
            fetched_at_ts: 0,
        };

        let display = build_display_snapshot(&snapshot, 1_000);
        let best = display.best.as_ref().expect("best offer expected");
        assert_eq!(best.index, 0);
        assert_eq!(best.platform, "Binance");
        assert_eq!(best.apy, "12.5%");

        assert!(display.rows[0].is_best);
        assert!(!display.rows[1].is_best);
        assert_eq!(display.rows[0].tags.len(), 2);
        assert_eq!(display.rows[0].tags[0].kind, "limit");
        assert_eq!(display.rows[1].tags.len(), 0);
    }

    #[test]
    fn rendering_is_idempotent_at_fixed_now() {
        let mut dated = offer("USDT", "Binance", "12.5%", Some(12.5));
        dated.start_ts = Some(1_000);
        dated.end_ts = Some(100_000);

        let snapshot = OfferSnapshot {
            offers: vec![dated],
            fetched_at_ts: 0,
        };

        let first = build_display_snapshot(&snapshot, 50_000);
        let second = build_display_snapshot(&snapshot, 50_000);
        assert_eq!(first, second);
        assert_eq!(
            render_dashboard_html(&first),
            render_dashboard_html(&second)
        );
    }

    #[test]
    fn rendered_html_contains_table_countdown_and_scripts() {
        let mut dated = offer("USDT", "Binance", "12.5%", Some(12.5));
        dated.start_ts = Some(1_000);
        dated.end_ts = Some(1_000 + 10 * 24 * 3600);
        dated.link = Some("https://example.com/go?a=1&b=2".to_string());

        let snapshot = OfferSnapshot {
            offers: vec![dated],
            fetched_at_ts: 0,
        };
        let display = build_display_snapshot(&snapshot, 1_000);
        let html = render_dashboard_html(&display);

        assert!(html.contains("alpha-table"));
        assert!(html.contains("当前最高收益"));
        assert!(html.contains("data-start=\"1000\""));
        assert!(html.contains("progress-fill"));
        assert!(html.contains("setInterval(tick, 1000)"));
        assert!(html.contains("calc-modal"));
        assert!(html.contains("前往 →"));
        // Interpolated URLs are escaped.
        assert!(html.contains("a=1&amp;b=2"));
        assert!(!html.contains("a=1&b=2\""));
    }

    #[test]
    fn ended_offer_renders_full_progress() {
        let mut ended = offer("USDT", "Binance", "12.5%", Some(12.5));
        ended.start_ts = Some(1_000);
        ended.end_ts = Some(2_000);

        let snapshot = OfferSnapshot {
            offers: vec![ended],
            fetched_at_ts: 0,
        };
        let display = build_display_snapshot(&snapshot, 5_000);

        assert_eq!(
            display.rows[0].countdown.label.as_deref(),
            Some(ENDED_LABEL)
        );
        let html = render_dashboard_html(&display);
        assert!(html.contains(ENDED_LABEL));
        assert!(html.contains("width:100.0%"));
    }

    #[test]
    fn offer_without_end_has_no_countdown_markup() {
        let snapshot = OfferSnapshot {
            offers: vec![offer("USDT", "Binance", "12.5%", Some(12.5))],
            fetched_at_ts: 0,
        };
        let display = build_display_snapshot(&snapshot, 1_000);
        let html = render_dashboard_html(&display);

        assert!(!html.contains("data-end"));
        assert!(html.contains("<td>-</td>"));
    }

    #[test]
    fn error_page_shows_notice() {
        let html = render_error_html("HTTP request failed");
        assert!(html.contains(FETCH_ERROR_NOTICE));
        assert!(html.contains("HTTP request failed"));
        assert!(!html.contains("alpha-table"));
    }
}
