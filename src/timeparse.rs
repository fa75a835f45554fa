//! Free-text time parsing for spreadsheet fields.
//!
//! Rules implemented:
//! - null sentinels ("暂无", "无截止", "-", "无") and blanks map to `None`
//! - numeric dates: `YYYY-MM-DD` / `YYYY/MM/DD`, optional trailing `HH:MM`
//! - localized compact dates: `M月D日`, optional `H` plus `点`/`:` and minutes
//! - year inference for compact dates with a ±6-month rollover window
//! - generic fallback over a fixed candidate-format list
//! - `N天` duration phrases, resolved against a known start elsewhere
//!
//! All timestamps are wall-clock Asia/Shanghai (the operating zone).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;

/// Fixed operating time zone for parsing and "now" comparisons alike.
pub const OPERATING_TZ: Tz = Shanghai;

/// Strings the sheet uses to mean "no value". Exact trimmed match.
pub const NULL_SENTINELS: [&str; 4] = ["暂无", "无截止", "-", "无"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Start,
    End,
}

pub fn is_null_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || NULL_SENTINELS.contains(&trimmed)
}

/// Sentinel scrub applied once at ingestion; downstream code sees options.
pub fn non_sentinel(raw: &str) -> Option<String> {
    if is_null_sentinel(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

pub fn now_in_operating_tz() -> DateTime<Tz> {
    Utc::now().with_timezone(&OPERATING_TZ)
}

pub fn parse_time(raw: &str, field: TimeField) -> Option<DateTime<Tz>> {
    parse_time_at(raw, field, now_in_operating_tz())
}

/// Parses a free-text time string relative to an explicit `now` so tests can
/// pin the clock. Formats are tried in order; first match wins.
pub fn parse_time_at(raw: &str, field: TimeField, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let trimmed = raw.trim();
    if is_null_sentinel(trimmed) {
        return None;
    }

    parse_numeric(trimmed, field)
        .or_else(|| parse_localized(trimmed, field, now))
        .or_else(|| parse_fallback(trimmed, field))
}

/// Recognizes duration phrases like "30天". Resolved as start + N days by the
/// caller when a start timestamp is known.
pub fn parse_duration_days(raw: &str) -> Option<i64> {
    let prefix = raw.trim().strip_suffix('天')?;
    let days = prefix.trim().parse::<i64>().ok()?;
    (days > 0).then_some(days)
}

fn default_time(field: TimeField) -> NaiveTime {
    match field {
        // An end date without a time means "until the end of that day".
        TimeField::End => NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default(),
        TimeField::Start => NaiveTime::MIN,
    }
}

fn default_minute(field: TimeField) -> u32 {
    match field {
        TimeField::End => 59,
        TimeField::Start => 0,
    }
}

fn parse_numeric(input: &str, field: TimeField) -> Option<DateTime<Tz>> {
    let normalized = input.replace('/', "-");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M") {
        return localize(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return localize(date.and_time(default_time(field)));
    }

    None
}

fn parse_localized(input: &str, field: TimeField, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let (month_raw, rest) = input.split_once('月')?;
    let (day_raw, time_raw) = rest.split_once('日')?;

    let month: u32 = month_raw.trim().parse().ok()?;
    let day: u32 = day_raw.trim().parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }

    let time_part = time_raw.trim();
    let time = if time_part.is_empty() {
        default_time(field)
    } else {
        let (hour_raw, minute_raw) = match time_part
            .split_once('点')
            .or_else(|| time_part.split_once(':'))
        {
            Some((hour, minute)) => (hour, Some(minute)),
            None => (time_part, None),
        };

        let hour: u32 = hour_raw.trim().parse().ok()?;
        let minute: u32 = match minute_raw.map(str::trim).filter(|m| !m.is_empty()) {
            Some(minute) => minute.parse().ok()?,
            None => default_minute(field),
        };
        NaiveTime::from_hms_opt(hour, minute, 0)?
    };

    let year = infer_year(month, field, now);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    localize(date.and_time(time))
}

/// Year rollover: an end time far in the "past" months belongs to next year
/// (December now, ends in January); a start time far in the "future" months
/// belongs to last year. Exactly six months out is a known boundary ambiguity.
fn infer_year(month: u32, field: TimeField, now: DateTime<Tz>) -> i32 {
    let mut year = now.year();
    let delta = now.month() as i32 - month as i32;

    match field {
        TimeField::End if delta >= 6 => year += 1,
        TimeField::Start if -delta >= 6 => year -= 1,
        _ => {}
    }

    year
}

const FALLBACK_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
    "%Y.%m.%d %H:%M",
];

const FALLBACK_DATE_FORMATS: [&str; 3] = ["%Y年%m月%d日", "%Y.%m.%d", "%d/%m/%Y"];

fn parse_fallback(input: &str, field: TimeField) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&OPERATING_TZ));
    }

    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return localize(dt);
        }
    }
    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return localize(date.and_time(default_time(field)));
        }
    }

    None
}

fn localize(dt: NaiveDateTime) -> Option<DateTime<Tz>> {
    // Asia/Shanghai has no DST transitions in the modern era, so local
    // wall-clock times resolve unambiguously.
    OPERATING_TZ.from_local_datetime(&dt).single()
}
