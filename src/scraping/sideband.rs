//! Structured payloads that pages ship to their own front end.
//!
//! Eventbrite assigns its listing state to a global in an inline script;
//! Meetup renders a Next.js data blob. Both are optional: any problem
//! locating or decoding them yields `None` and the caller carries on with
//! whatever the DOM offered.

use serde_json::Value;
use tracing::debug;

use super::base::{json_count, json_text};
use crate::models::{EmbeddedEvent, TicketSummary};

pub const SERVER_DATA_MARKER: &str = "window.__SERVER_DATA__";
pub const NEXT_DATA_SELECTOR: &str = "script#__NEXT_DATA__";

/// Sums the ticket classes in the `window.__SERVER_DATA__` assignment.
///
/// The assignment is decoded with a streaming JSON reader that stops after
/// the first complete value, so braces or `};` inside string values do not
/// truncate the payload.
pub fn ticket_inventory(raw_source: &str) -> Option<TicketSummary> {
    let Some(object) = raw_source
        .match_indices(SERVER_DATA_MARKER)
        .find_map(|(at, _)| assigned_object(&raw_source[at + SERVER_DATA_MARKER.len()..]))
    else {
        debug!("no object assignment to server data marker");
        return None;
    };

    let mut values = serde_json::Deserializer::from_str(object).into_iter::<Value>();
    let payload = match values.next()? {
        Ok(value) => value,
        Err(err) => {
            debug!("server data payload is malformed: {err}");
            return None;
        }
    };
    ticket_summary(&payload)
}

/// Text starting at the `{` when `after_marker` reads `= {`; reads such as
/// `typeof window.__SERVER_DATA__` or `==` comparisons are skipped.
fn assigned_object(after_marker: &str) -> Option<&str> {
    let rest = after_marker.trim_start().strip_prefix('=')?;
    if rest.starts_with('=') {
        return None;
    }
    let rest = rest.trim_start();
    rest.starts_with('{').then_some(rest)
}

pub fn ticket_summary(payload: &Value) -> Option<TicketSummary> {
    let classes = payload
        .pointer("/listing/tickets/ticketClasses")?
        .as_array()?;

    let mut total_capacity = 0i64;
    let mut tickets_sold = 0i64;
    let mut counted = 0usize;
    let mut ticket_statuses = Vec::new();

    for class in classes {
        if let Some(status) = json_text(class.get("status").or_else(|| class.get("salesStatus"))) {
            ticket_statuses.push(status);
        }
        let Some(capacity) = json_count(class.get("capacity")) else {
            continue;
        };
        let remaining = json_count(class.get("quantityRemaining")).unwrap_or(capacity);
        total_capacity = total_capacity.saturating_add(capacity);
        tickets_sold = tickets_sold.saturating_add((capacity - remaining).max(0));
        counted += 1;
    }

    if counted == 0 {
        return None;
    }

    Some(TicketSummary {
        total_capacity,
        tickets_sold,
        tickets_remaining: total_capacity - tickets_sold,
        ticket_statuses,
    })
}

/// Reads `props.pageProps.event` out of a `__NEXT_DATA__` script body.
pub fn next_data_event(script_body: &str) -> Option<EmbeddedEvent> {
    let data: Value = match serde_json::from_str(script_body.trim()) {
        Ok(value) => value,
        Err(err) => {
            debug!("next data payload is malformed: {err}");
            return None;
        }
    };
    let event = data.pointer("/props/pageProps/event")?.as_object()?;
    if event.is_empty() {
        return None;
    }

    let mut extracted = EmbeddedEvent {
        title: json_text(event.get("title")),
        description: json_text(event.get("description")),
        event_url: json_text(event.get("eventUrl")),
        start_datetime: json_text(event.get("dateTime")),
        end_datetime: json_text(event.get("endTime")),
        timezone: json_text(event.get("timezone")),
        going_count: json_count(event.get("goingCount").and_then(|count| count.get("totalCount")))
            .unwrap_or(0),
        ..EmbeddedEvent::default()
    };

    if let Some(venue) = event.get("venue").and_then(Value::as_object) {
        extracted.venue_name = json_text(venue.get("name"));
        extracted.venue_address = json_text(venue.get("address"));
        extracted.venue_city = json_text(venue.get("city"));
        extracted.venue_state = json_text(venue.get("state"));
        extracted.latitude = json_text(venue.get("lat"));
        extracted.longitude = json_text(venue.get("lng"));
    }

    extracted.image_url = event
        .get("featuredEventPhoto")
        .and_then(|photo| json_text(photo.get("source")));

    if let (Some(address), Some(city)) = (&extracted.venue_address, &extracted.venue_city) {
        let mut full = format!("{address}, {city}");
        if let Some(state) = &extracted.venue_state {
            full.push_str(", ");
            full.push_str(state);
        }
        extracted.full_address = Some(full);
    }

    Some(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKET_PAGE: &str = r#"
    <script>
        window.__SERVER_DATA__ = {"listing": {"tickets": {"ticketClasses": [
            {"capacity": 100, "quantityRemaining": 30, "status": "AVAILABLE"},
            {"capacity": 50, "quantityRemaining": 50, "status": "AVAILABLE"}
        ]}}, "note": "closing }; inside a string"};
        window.__OTHER__ = {};
    </script>
    "#;

    const NEXT_DATA: &str = r#"{
        "props": {"pageProps": {"event": {
            "title": "Brooklyn Board Games",
            "description": "Bring a game.\n\nOr don't.",
            "eventUrl": "https://www.meetup.com/games/events/301/",
            "dateTime": "2024-05-01T18:00:00-04:00",
            "endTime": "2024-05-01T21:00:00-04:00",
            "timezone": "America/New_York",
            "goingCount": {"totalCount": 42},
            "venue": {
                "name": "Hex & Co",
                "address": "2911 Broadway",
                "city": "New York",
                "state": "NY",
                "lat": 40.806,
                "lng": -73.965
            },
            "featuredEventPhoto": {"source": "https://secure.meetupstatic.com/photos/301.jpeg"}
        }}}
    }"#;

    #[test]
    fn sums_ticket_classes() {
        let summary = ticket_inventory(TICKET_PAGE).expect("ticket data");
        assert_eq!(summary.total_capacity, 150);
        assert_eq!(summary.tickets_sold, 70);
        assert_eq!(summary.tickets_remaining, 80);
        assert_eq!(summary.ticket_statuses, vec!["AVAILABLE", "AVAILABLE"]);
    }

    #[test]
    fn skips_reads_of_the_global_before_its_assignment() {
        let page = r#"<script>
            if (!window.__SERVER_DATA__) { console.log("pending"); }
            if (typeof window.__SERVER_DATA__ === "undefined" || window.__SERVER_DATA__ == null) {}
            window.__SERVER_DATA__ = {"listing": {"tickets": {"ticketClasses": [
                {"capacity": 10, "quantityRemaining": 4}
            ]}}};
        </script>"#;
        let summary = ticket_inventory(page).expect("ticket data");
        assert_eq!(summary.total_capacity, 10);
        assert_eq!(summary.tickets_sold, 6);
        assert_eq!(summary.tickets_remaining, 4);
    }

    #[test]
    fn ticket_data_is_optional() {
        assert_eq!(ticket_inventory("<html>no globals</html>"), None);
        assert_eq!(
            ticket_inventory("window.__SERVER_DATA__ = {\"listing\": {\"tickets\": "),
            None
        );
        assert_eq!(
            ticket_inventory(r#"window.__SERVER_DATA__ = {"listing": {}};"#),
            None
        );
        assert_eq!(
            ticket_inventory(
                r#"window.__SERVER_DATA__ = {"listing": {"tickets": {"ticketClasses": []}}};"#
            ),
            None
        );
    }

    #[test]
    fn string_counts_and_oversold_classes_stay_non_negative() {
        let page = r#"window.__SERVER_DATA__ = {"listing": {"tickets": {"ticketClasses": [
            {"capacity": "20", "quantityRemaining": "25", "status": "SOLD_OUT"},
            {"capacity": 10},
            {"status": "HIDDEN"}
        ]}}};"#;
        let summary = ticket_inventory(page).expect("ticket data");
        assert_eq!(summary.total_capacity, 30);
        assert_eq!(summary.tickets_sold, 0);
        assert_eq!(summary.tickets_remaining, 30);
        assert_eq!(summary.ticket_statuses, vec!["SOLD_OUT", "HIDDEN"]);
    }

    #[test]
    fn reads_embedded_meetup_event() {
        let event = next_data_event(NEXT_DATA).expect("event");
        assert_eq!(event.title.as_deref(), Some("Brooklyn Board Games"));
        assert_eq!(event.description.as_deref(), Some("Bring a game.\n\nOr don't."));
        assert_eq!(event.going_count, 42);
        assert_eq!(event.latitude.as_deref(), Some("40.806"));
        assert_eq!(event.longitude.as_deref(), Some("-73.965"));
        assert_eq!(event.venue_name.as_deref(), Some("Hex & Co"));
        assert_eq!(
            event.full_address.as_deref(),
            Some("2911 Broadway, New York, NY")
        );
        assert_eq!(
            event.image_url.as_deref(),
            Some("https://secure.meetupstatic.com/photos/301.jpeg")
        );
    }

    #[test]
    fn embedded_event_without_venue_or_count() {
        let event = next_data_event(
            r#"{"props": {"pageProps": {"event": {"title": "Online Meetup", "venue": null}}}}"#,
        )
        .expect("event");
        assert_eq!(event.going_count, 0);
        assert_eq!(event.full_address, None);
        assert_eq!(event.latitude, None);
    }

    #[test]
    fn unresolved_next_data_path_is_none() {
        assert_eq!(next_data_event("not json"), None);
        assert_eq!(next_data_event(r#"{"props": {"pageProps": {}}}"#), None);
        assert_eq!(next_data_event(r#"{"props": {"pageProps": {"event": {}}}}"#), None);
    }
}
