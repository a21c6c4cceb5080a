use once_cell::sync::Lazy;
use regex::Regex;

static DADDR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[?&]daddr=\s*(-?\d+(?:\.\d+)?)\s*(?:,|%2C)\s*(-?\d+(?:\.\d+)?)")
        .expect("valid daddr regex")
});

/// Pulls `(lat, lng)` out of a driving-directions link such as
/// `https://maps.google.com/maps/dir/?daddr=40.71,-74.00`. Values stay as
/// text; numeric coercion happens during assembly.
pub fn coordinates_from_directions(url: &str) -> (Option<String>, Option<String>) {
    match DADDR_RE.captures(url) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    }
}
