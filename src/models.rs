use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTag {
    Eventbrite,
    Meetup,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Eventbrite => "EVENTBRITE",
            SourceTag::Meetup => "MEETUP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EVENTBRITE" => Some(SourceTag::Eventbrite),
            "MEETUP" => Some(SourceTag::Meetup),
            _ => None,
        }
    }
}

/// Canonical event row. `page_url` is the identity; everything else may be
/// missing depending on the source and on what the page exposed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub date_time: Option<String>,
    pub summary: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub directions_url: Option<String>,
    pub page_url: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub total_capacity: Option<i64>,
    pub tickets_sold: Option<i64>,
    pub tickets_remaining: Option<i64>,
    pub event_start_time: Option<DateTime<FixedOffset>>,
    pub event_end_time: Option<DateTime<FixedOffset>>,
    pub source_tag: SourceTag,
}

impl EventRecord {
    pub fn empty(page_url: String, source_tag: SourceTag) -> Self {
        Self {
            title: None,
            start_date: None,
            date_time: None,
            summary: None,
            address: None,
            image_url: None,
            directions_url: None,
            page_url,
            latitude: None,
            longitude: None,
            total_capacity: None,
            tickets_sold: None,
            tickets_remaining: None,
            event_start_time: None,
            event_end_time: None,
            source_tag,
        }
    }

    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| "Untitled Event".to_string())
    }
}

/// A row as read back from the store, with the adapter-managed timestamps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredEvent {
    #[serde(flatten)]
    pub record: EventRecord,
    pub time_added: DateTime<Utc>,
    pub time_updated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct TicketSummary {
    pub total_capacity: i64,
    pub tickets_sold: i64,
    pub tickets_remaining: i64,
    pub ticket_statuses: Vec<String>,
}

/// Event object embedded in a Meetup page's render payload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct EmbeddedEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_url: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub timezone: Option<String>,
    pub going_count: i64,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub venue_city: Option<String>,
    pub venue_state: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub image_url: Option<String>,
    pub full_address: Option<String>,
}
