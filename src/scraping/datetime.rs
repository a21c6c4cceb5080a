use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const LONG_FORMAT: &str = "%A, %B %-d, %Y at %-I:%M %p";
const SHORT_FORMAT: &str = "%-I:%M %p";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTimes {
    pub date_time: Option<String>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

/// Turns raw start/end stamps into the display composite plus the parsed
/// instants. Nothing here fails: unparsable input just leaves fields empty.
/// An end stamp that is present but unreadable voids the composite, while
/// `start` is still filled in.
///
/// `timezone` is an IANA name. When it resolves, naive stamps are read in
/// that zone and the composite is rendered there; otherwise each instant is
/// shown in its own offset.
pub fn normalize_datetimes(
    start: Option<&str>,
    end: Option<&str>,
    timezone: Option<&str>,
) -> NormalizedTimes {
    let tz = timezone.and_then(|name| name.trim().parse::<Tz>().ok());
    let start = start.and_then(|text| parse_instant(text, tz));
    let end_given = end.is_some_and(|text| !text.trim().is_empty());
    let end = end.and_then(|text| parse_instant(text, tz));

    let date_time = start.and_then(|start_dt| {
        let long = render(&start_dt, tz, LONG_FORMAT);
        match end {
            Some(end_dt) => Some(format!("{long} - {}", render(&end_dt, tz, SHORT_FORMAT))),
            None if end_given => None,
            None => Some(long),
        }
    });

    NormalizedTimes {
        date_time,
        start,
        end,
    }
}

pub fn parse_instant(text: &str, tz: Option<Tz>) -> Option<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return match tz {
                Some(tz) => localize(&tz, &naive),
                None => Some(Utc.from_utc_datetime(&naive).fixed_offset()),
            };
        }
    }
    None
}

fn localize(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt.fixed_offset()),
        LocalResult::Ambiguous(dt, _) => Some(dt.fixed_offset()),
        LocalResult::None => None,
    }
}

fn render(dt: &DateTime<FixedOffset>, tz: Option<Tz>, fmt: &str) -> String {
    match tz {
        Some(tz) => dt.with_timezone(&tz).format(fmt).to_string(),
        None => dt.format(fmt).to_string(),
    }
}
