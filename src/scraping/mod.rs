pub mod assemble;
pub mod base;
pub mod datetime;
pub mod eventbrite;
pub mod fields;
pub mod geo;
pub mod meetup;
pub mod page;
pub mod sideband;

use serde::Serialize;
use tracing::debug;

use crate::models::{EmbeddedEvent, SourceTag, TicketSummary};
use fields::FieldLocator;
use page::{PageAccessor, INNER_HTML};

/// Which embedded payload a source ships alongside its markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sideband {
    /// Global `window.__SERVER_DATA__` assignment holding ticket classes.
    TicketInventory,
    /// Script element whose body is a Next.js render payload.
    EmbeddedEvent { selector: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebandData {
    Tickets(Option<TicketSummary>),
    Event(Option<EmbeddedEvent>),
}

/// Everything that differs between sources: identity, DOM locators and the
/// payload to read. The pipeline itself is shared.
#[derive(Debug, Clone, Copy)]
pub struct SourceProfile {
    pub tag: SourceTag,
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub locators: &'static [FieldLocator],
    pub sideband: Sideband,
}

impl SourceProfile {
    pub fn read_sideband(&self, page: &dyn PageAccessor) -> SidebandData {
        match self.sideband {
            Sideband::TicketInventory => {
                SidebandData::Tickets(sideband::ticket_inventory(&page.raw_source()))
            }
            Sideband::EmbeddedEvent { selector } => {
                let event = match page.attribute(selector, INNER_HTML) {
                    Ok(body) => sideband::next_data_event(&body),
                    Err(err) => {
                        debug!(source = self.id, "embedded event unavailable: {err}");
                        None
                    }
                };
                SidebandData::Event(event)
            }
        }
    }
}

#[derive(Clone, Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

fn active_profiles() -> [&'static SourceProfile; 2] {
    [&eventbrite::PROFILE, &meetup::PROFILE]
}

pub fn list_sources() -> Vec<SourceInfo> {
    active_profiles()
        .into_iter()
        .map(|profile| SourceInfo {
            id: profile.id.to_string(),
            name: profile.name.to_string(),
            url: profile.url.to_string(),
        })
        .collect()
}

pub fn profile_for(tag: SourceTag) -> &'static SourceProfile {
    match tag {
        SourceTag::Eventbrite => &eventbrite::PROFILE,
        SourceTag::Meetup => &meetup::PROFILE,
    }
}

/// Looks a profile up by its short id (`eventbrite`) or its tag (`MEETUP`).
pub fn find_profile(id: &str) -> Option<&'static SourceProfile> {
    if let Some(tag) = SourceTag::parse(id) {
        return Some(profile_for(tag));
    }
    active_profiles()
        .into_iter()
        .find(|profile| profile.id.eq_ignore_ascii_case(id.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_resolve_by_id_or_tag() {
        assert_eq!(find_profile("eventbrite").map(|p| p.tag), Some(SourceTag::Eventbrite));
        assert_eq!(find_profile("MEETUP").map(|p| p.tag), Some(SourceTag::Meetup));
        assert!(find_profile("ticketmaster").is_none());
        assert_eq!(list_sources().len(), 2);
    }

    #[test]
    fn every_profile_locates_a_page_url() {
        for profile in active_profiles() {
            assert!(
                profile
                    .locators
                    .iter()
                    .any(|entry| entry.field == fields::PAGE_URL),
                "{} has no page url locator",
                profile.id
            );
        }
    }
}
