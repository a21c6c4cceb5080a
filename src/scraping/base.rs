use scraper::ElementRef;
use serde_json::Value;

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Cleaned text, or `None` when nothing but whitespace is left.
pub fn non_blank(input: &str) -> Option<String> {
    let cleaned = clean_text(input);
    (!cleaned.is_empty()).then_some(cleaned)
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

/// Finite float from loosely formatted text; anything else is `None`.
pub fn parse_coordinate(text: Option<&str>) -> Option<f64> {
    let value = text?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Non-negative integer count. Accepts "1,200" and "12.0"; rejects
/// negatives, fractions and blanks.
pub fn parse_count(text: Option<&str>) -> Option<i64> {
    let cleaned = text?.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(value) = cleaned.parse::<i64>() {
        return (value >= 0).then_some(value);
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Renders a scalar JSON value as text; objects, arrays and null give `None`.
pub fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => {
            let cleaned = text.trim();
            (!cleaned.is_empty()).then(|| cleaned.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn json_count(value: Option<&Value>) -> Option<i64> {
    parse_count(json_text(value).as_deref())
}
