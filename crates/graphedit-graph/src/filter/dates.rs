use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

pub const DAY_MS: i64 = 86_400_000;

/// Parses the date shapes attribute values use into UTC milliseconds.
/// Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc().timestamp_millis())
    })
}

/// Inclusive range check. A bound that is missing or unparseable is open;
/// equal bounds widen to cover the whole day.
pub fn in_range(value: &str, from: Option<&str>, to: Option<&str>) -> bool {
    let Some(at) = parse_timestamp(value) else {
        return false;
    };
    let from = from.and_then(parse_timestamp);
    let mut to = to.and_then(parse_timestamp);
    if let (Some(start), Some(end)) = (from, to) {
        if start == end {
            to = Some(end + DAY_MS);
        }
    }
    from.is_none_or(|start| at >= start) && to.is_none_or(|end| at <= end)
}
