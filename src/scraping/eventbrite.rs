use super::fields::{self, FieldLocator};
use super::{Sideband, SourceProfile};
use crate::models::SourceTag;

const LOCATORS: &[FieldLocator] = &[
    FieldLocator::text(fields::TITLE, "h1.event-title"),
    FieldLocator::text(fields::START_DATE, "span.start-date-and-location__date"),
    FieldLocator::text(fields::DATE_TIME, "span.date-info__full-datetime"),
    FieldLocator::text(fields::SUMMARY, "p.summary").or_placeholder("No summary available"),
    FieldLocator::text(fields::ADDRESS, "p.location-info__address"),
    FieldLocator::attr(fields::IMAGE_URL, "meta[property='og:image']", "content"),
    FieldLocator::attr(fields::DIRECTIONS_URL, "a[href*='daddr=']", "href"),
    FieldLocator::current_url(fields::PAGE_URL),
];

pub static PROFILE: SourceProfile = SourceProfile {
    tag: SourceTag::Eventbrite,
    id: "eventbrite",
    name: "Eventbrite",
    url: "https://www.eventbrite.com/d/ny--new-york--manhattan/events--today/",
    locators: LOCATORS,
    sideband: Sideband::TicketInventory,
};
