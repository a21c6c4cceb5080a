use super::base::parse_coordinate;
use super::datetime::normalize_datetimes;
use super::fields::{self, FieldBag};
use super::geo::coordinates_from_directions;
use super::{SidebandData, SourceProfile};
use crate::models::{EmbeddedEvent, EventRecord, SourceTag, TicketSummary};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    #[error("{0:?} page has no usable page url")]
    MissingPageUrl(SourceTag),
}

/// Builds the canonical record for one page visit. The only hard failure is
/// a missing page URL, since that is the row identity.
pub fn assemble(
    profile: &SourceProfile,
    mut bag: FieldBag,
    sideband: SidebandData,
) -> Result<EventRecord, AssembleError> {
    let record = match sideband {
        SidebandData::Tickets(tickets) => from_dom(profile.tag, &mut bag, tickets.as_ref()),
        SidebandData::Event(Some(event)) => from_embedded(profile.tag, &mut bag, event),
        SidebandData::Event(None) => from_dom(profile.tag, &mut bag, None),
    }?;
    Ok(fill_coordinates(record))
}

fn from_dom(
    tag: SourceTag,
    bag: &mut FieldBag,
    tickets: Option<&TicketSummary>,
) -> Result<EventRecord, AssembleError> {
    let page_url = bag
        .take(fields::PAGE_URL)
        .ok_or(AssembleError::MissingPageUrl(tag))?;

    let mut record = EventRecord::empty(page_url, tag);
    record.title = bag.take(fields::TITLE);
    record.start_date = bag.take(fields::START_DATE);
    record.date_time = bag.take(fields::DATE_TIME);
    record.summary = bag.take(fields::SUMMARY);
    record.address = bag.take(fields::ADDRESS);
    record.image_url = bag.take(fields::IMAGE_URL);
    record.directions_url = bag.take(fields::DIRECTIONS_URL);

    if let Some(tickets) = tickets {
        record.total_capacity = Some(tickets.total_capacity);
        record.tickets_sold = Some(tickets.tickets_sold);
        record.tickets_remaining = Some(tickets.tickets_remaining);
    }
    Ok(record)
}

fn from_embedded(
    tag: SourceTag,
    bag: &mut FieldBag,
    event: EmbeddedEvent,
) -> Result<EventRecord, AssembleError> {
    let page_url = event
        .event_url
        .or_else(|| bag.take(fields::PAGE_URL))
        .ok_or(AssembleError::MissingPageUrl(tag))?;

    let times = normalize_datetimes(
        event.start_datetime.as_deref(),
        event.end_datetime.as_deref(),
        event.timezone.as_deref(),
    );

    let mut record = EventRecord::empty(page_url, tag);
    record.title = event.title.or_else(|| bag.take(fields::TITLE));
    record.summary = event.description.or_else(|| bag.take(fields::SUMMARY));
    record.address = event.full_address.or(event.venue_address);
    record.image_url = event.image_url.or_else(|| bag.take(fields::IMAGE_URL));
    record.directions_url = bag.take(fields::DIRECTIONS_URL);
    record.date_time = times.date_time;
    record.event_start_time = times.start;
    record.event_end_time = times.end;
    record.latitude = parse_coordinate(event.latitude.as_deref());
    record.longitude = parse_coordinate(event.longitude.as_deref());
    record.tickets_sold = (event.going_count >= 0).then_some(event.going_count);
    Ok(record)
}

/// Coordinates come from the payload when it has them, otherwise from the
/// directions link. A half-parsed pair is dropped entirely.
fn fill_coordinates(mut record: EventRecord) -> EventRecord {
    if record.latitude.is_none() || record.longitude.is_none() {
        let (lat, lng) = record
            .directions_url
            .as_deref()
            .map(coordinates_from_directions)
            .unwrap_or((None, None));
        record.latitude = parse_coordinate(lat.as_deref());
        record.longitude = parse_coordinate(lng.as_deref());
    }
    if record.latitude.is_none() || record.longitude.is_none() {
        record.latitude = None;
        record.longitude = None;
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::{eventbrite, meetup};

    fn bag(entries: &[(&'static str, Option<&str>)]) -> FieldBag {
        let mut bag = FieldBag::default();
        for &(field, value) in entries {
            bag.insert(field, value.map(str::to_string));
        }
        bag
    }

    #[test]
    fn missing_page_url_is_rejected() {
        let result = assemble(
            &eventbrite::PROFILE,
            bag(&[(fields::TITLE, Some("No Home")), (fields::PAGE_URL, None)]),
            SidebandData::Tickets(None),
        );
        assert_eq!(result, Err(AssembleError::MissingPageUrl(SourceTag::Eventbrite)));

        let result = assemble(&meetup::PROFILE, FieldBag::default(), SidebandData::Event(None));
        assert_eq!(result, Err(AssembleError::MissingPageUrl(SourceTag::Meetup)));
    }

    #[test]
    fn directions_link_supplies_coordinates() {
        let record = assemble(
            &eventbrite::PROFILE,
            bag(&[
                (fields::PAGE_URL, Some("https://www.eventbrite.com/e/1")),
                (
                    fields::DIRECTIONS_URL,
                    Some("https://maps.test/directions?daddr=40.712776,-74.005974"),
                ),
            ]),
            SidebandData::Tickets(None),
        )
        .expect("record");
        assert_eq!(record.latitude, Some(40.712776));
        assert_eq!(record.longitude, Some(-74.005974));
    }

    #[test]
    fn bad_coordinates_become_null() {
        let event = EmbeddedEvent {
            event_url: Some("https://www.meetup.com/g/events/9/".to_string()),
            latitude: Some("forty".to_string()),
            longitude: Some("-73.9".to_string()),
            ..EmbeddedEvent::default()
        };
        let record = assemble(&meetup::PROFILE, FieldBag::default(), SidebandData::Event(Some(event)))
            .expect("record");
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
        assert_eq!(record.tickets_sold, Some(0));
    }

    #[test]
    fn unsupported_fields_are_explicitly_empty() {
        let event = EmbeddedEvent {
            event_url: Some("https://www.meetup.com/g/events/9/".to_string()),
            venue_address: Some("1 Main St".to_string()),
            ..EmbeddedEvent::default()
        };
        let record = assemble(
            &meetup::PROFILE,
            bag(&[(fields::START_DATE, Some("Wed, May 1"))]),
            SidebandData::Event(Some(event)),
        )
        .expect("record");
        assert_eq!(record.start_date, None);
        assert_eq!(record.total_capacity, None);
        assert_eq!(record.address.as_deref(), Some("1 Main St"));
    }
}
