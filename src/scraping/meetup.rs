use super::fields::{self, FieldLocator};
use super::sideband::NEXT_DATA_SELECTOR;
use super::{Sideband, SourceProfile};
use crate::models::SourceTag;

// Only consulted when the render payload is missing.
const LOCATORS: &[FieldLocator] = &[
    FieldLocator::text(fields::TITLE, "h1"),
    FieldLocator::attr(fields::SUMMARY, "meta[name='description']", "content"),
    FieldLocator::attr(fields::IMAGE_URL, "meta[property='og:image']", "content"),
    FieldLocator::attr(fields::DIRECTIONS_URL, "a[href*='daddr=']", "href"),
    FieldLocator::current_url(fields::PAGE_URL),
];

pub static PROFILE: SourceProfile = SourceProfile {
    tag: SourceTag::Meetup,
    id: "meetup",
    name: "Meetup",
    url: "https://www.meetup.com/find/?location=us--ny--Manhattan&source=EVENTS&dateRange=today&eventType=inPerson",
    locators: LOCATORS,
    sideband: Sideband::EmbeddedEvent {
        selector: NEXT_DATA_SELECTOR,
    },
};
