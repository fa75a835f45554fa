//! Remaining-time labels and elapsed-progress percentages for offer windows.

use serde::{Deserialize, Serialize};

/// Shown when the offer window has already closed.
pub const ENDED_LABEL: &str = "已结束";

/// Synthetic window length assumed when an offer has an end time but no start
/// time. 30 days is an inherited business assumption, not a derived value;
/// kept configurable at this one site pending product confirmation.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const SECONDS_PER_HOUR: i64 = 60 * 60;

/// Snapshot of an offer's countdown at a fixed `now`. The resolved
/// start/end timestamps ride along so the page script can re-run the same
/// formulas client-side without another fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub label: Option<String>,
    pub progress: Option<f64>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

impl Countdown {
    pub fn empty() -> Self {
        Self {
            label: None,
            progress: None,
            start_ts: None,
            end_ts: None,
        }
    }
}

/// Derives label and progress from optional start/end unix timestamps
/// (seconds, operating zone). No end time means no countdown at all.
pub fn compute_countdown(start_ts: Option<i64>, end_ts: Option<i64>, now_ts: i64) -> Countdown {
    let Some(end) = end_ts else {
        return Countdown::empty();
    };

    let start = start_ts.unwrap_or_else(|| {
        end.saturating_sub(DEFAULT_LOOKBACK_DAYS.saturating_mul(SECONDS_PER_DAY))
    });

    if end <= now_ts {
        return Countdown {
            label: Some(ENDED_LABEL.to_string()),
            progress: Some(100.0),
            start_ts: Some(start),
            end_ts: Some(end),
        };
    }

    let remaining = end - now_ts;
    let label = remaining_label(remaining);

    // Degenerate zero-length window counts as one second so the elapsed
    // fraction stays defined.
    let duration = (end - start).max(1);
    let elapsed = now_ts - start;
    let progress = (elapsed as f64 / duration as f64 * 100.0).clamp(0.0, 100.0);

    Countdown {
        label: Some(label),
        progress: Some(progress),
        start_ts: Some(start),
        end_ts: Some(end),
    }
}

fn remaining_label(remaining_secs: i64) -> String {
    let days = remaining_secs / SECONDS_PER_DAY;
    let hours = (remaining_secs % SECONDS_PER_DAY) / SECONDS_PER_HOUR;

    if days >= 1 {
        format!("{days}天{hours}小时")
    } else {
        format!("{hours}小时")
    }
}
