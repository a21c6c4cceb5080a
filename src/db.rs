use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::bounds::GeoBounds;
use crate::models::{EventRecord, SourceTag, StoredEvent};
use crate::utils;

/// Write side of the pipeline. Implementations never propagate storage
/// errors; `false` means the record was not stored.
///
/// Callers must only hand over records with a non-empty `page_url`.
pub trait EventSink {
    fn upsert(&mut self, record: &EventRecord) -> bool;
}

pub struct Store {
    conn: Connection,
}

const SELECT_COLUMNS: &str = "event_title, event_start_date, event_date_time, event_summary,
    event_address, event_image_url, directions_url, event_page_url, latitude, longitude,
    total_capacity, tickets_sold, tickets_remaining, event_start_time, event_end_time,
    event_source, time_added, time_updated";

impl Store {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS events(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_title TEXT,
                event_start_date TEXT,
                event_date_time TEXT,
                event_summary TEXT,
                event_address TEXT,
                event_image_url TEXT,
                directions_url TEXT,
                event_page_url TEXT NOT NULL UNIQUE,
                latitude REAL,
                longitude REAL,
                total_capacity INTEGER,
                tickets_sold INTEGER,
                tickets_remaining INTEGER,
                event_start_time TEXT,
                event_end_time TEXT,
                event_end_epoch INTEGER,
                event_source TEXT NOT NULL,
                time_added TEXT NOT NULL,
                time_updated TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_end_epoch ON events(event_end_epoch);
            CREATE INDEX IF NOT EXISTS idx_events_coordinates ON events(latitude, longitude);",
        )?;
        Ok(())
    }

    /// Inserts or refreshes the row for `record.page_url` inside one
    /// transaction. `time_added` is only ever written by the insert branch.
    pub fn upsert_event_at(&mut self, record: &EventRecord, now: DateTime<Utc>) -> rusqlite::Result<()> {
        let now = now.to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO events (
                event_title, event_start_date, event_date_time, event_summary,
                event_address, event_image_url, directions_url, event_page_url,
                latitude, longitude, total_capacity, tickets_sold, tickets_remaining,
                event_start_time, event_end_time, event_end_epoch, event_source,
                time_added, time_updated
            ) VALUES (
                :title, :start_date, :date_time, :summary,
                :address, :image_url, :directions_url, :page_url,
                :latitude, :longitude, :total_capacity, :tickets_sold, :tickets_remaining,
                :start_time, :end_time, :end_epoch, :source,
                :now, :now
            )
            ON CONFLICT(event_page_url) DO UPDATE SET
                event_title = excluded.event_title,
                event_start_date = excluded.event_start_date,
                event_date_time = excluded.event_date_time,
                event_summary = excluded.event_summary,
                event_address = excluded.event_address,
                event_image_url = excluded.event_image_url,
                directions_url = excluded.directions_url,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                total_capacity = excluded.total_capacity,
                tickets_sold = excluded.tickets_sold,
                tickets_remaining = excluded.tickets_remaining,
                event_start_time = excluded.event_start_time,
                event_end_time = excluded.event_end_time,
                event_end_epoch = excluded.event_end_epoch,
                event_source = excluded.event_source,
                time_updated = excluded.time_updated",
            named_params! {
                ":title": record.title,
                ":start_date": record.start_date,
                ":date_time": record.date_time,
                ":summary": record.summary,
                ":address": record.address,
                ":image_url": record.image_url,
                ":directions_url": record.directions_url,
                ":page_url": record.page_url,
                ":latitude": record.latitude,
                ":longitude": record.longitude,
                ":total_capacity": record.total_capacity,
                ":tickets_sold": record.tickets_sold,
                ":tickets_remaining": record.tickets_remaining,
                ":start_time": record.event_start_time.map(|dt| dt.to_rfc3339()),
                ":end_time": record.event_end_time.map(|dt| dt.to_rfc3339()),
                ":end_epoch": record.event_end_time.map(|dt| dt.timestamp()),
                ":source": record.source_tag.as_str(),
                ":now": now,
            },
        )?;
        // an early return above drops `tx`, which rolls it back
        tx.commit()
    }

    pub fn get_event(&self, page_url: &str) -> rusqlite::Result<Option<StoredEvent>> {
        self.conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM events WHERE event_page_url = ?1"),
                params![page_url],
                row_to_event,
            )
            .optional()
    }

    /// Events that have not ended yet, soonest-ending first.
    pub fn list_active_events(&self, now: DateTime<Utc>) -> rusqlite::Result<Vec<StoredEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM events
             WHERE event_end_epoch > ?1
             ORDER BY event_end_epoch ASC"
        ))?;
        let rows = stmt.query_map(params![now.timestamp()], row_to_event)?;
        rows.collect()
    }

    pub fn list_events_in_bounds(
        &self,
        bounds: &GeoBounds,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<Vec<StoredEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM events
             WHERE event_end_epoch > :now
               AND latitude BETWEEN :south AND :north
               AND longitude BETWEEN :west AND :east
             ORDER BY event_end_epoch ASC"
        ))?;
        let rows = stmt.query_map(
            named_params! {
                ":now": now.timestamp(),
                ":south": bounds.south,
                ":north": bounds.north,
                ":west": bounds.west,
                ":east": bounds.east,
            },
            row_to_event,
        )?;
        let events = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(count = events.len(), "events in bounds");
        Ok(events)
    }

    pub fn list_events_within_radius(
        &self,
        lat: f64,
        lng: f64,
        radius_miles: f64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<StoredEvent>> {
        let bounds = GeoBounds::around(lat, lng, radius_miles)?;
        Ok(self.list_events_in_bounds(&bounds, now)?)
    }

    pub fn count_events(&self) -> rusqlite::Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
    }
}

impl EventSink for Store {
    fn upsert(&mut self, record: &EventRecord) -> bool {
        if record.page_url.trim().is_empty() {
            warn!(title = ?record.title, "refusing to store event without page url");
            return false;
        }
        match self.upsert_event_at(record, Utc::now()) {
            Ok(()) => true,
            Err(err) => {
                warn!(page_url = %record.page_url, "database error for {}: {err}", record.display_title());
                false
            }
        }
    }
}

fn conversion_error(column: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_offset_time(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<DateTime<FixedOffset>>> {
    let index = row.as_ref().column_index(column)?;
    let raw: Option<String> = row.get(index)?;
    raw.map(|text| DateTime::parse_from_rfc3339(&text).map_err(|err| conversion_error(index, err)))
        .transpose()
}

fn parse_utc_time(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let index = row.as_ref().column_index(column)?;
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| conversion_error(index, err))
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<StoredEvent> {
    let source: String = row.get("event_source")?;
    let source_tag = SourceTag::parse(&source).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(
            15,
            format!("event_source={source}"),
            rusqlite::types::Type::Text,
        )
    })?;

    let record = EventRecord {
        title: row.get("event_title")?,
        start_date: row.get("event_start_date")?,
        date_time: row.get("event_date_time")?,
        summary: row.get("event_summary")?,
        address: row.get("event_address")?,
        image_url: row.get("event_image_url")?,
        directions_url: row.get("directions_url")?,
        page_url: row.get("event_page_url")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        total_capacity: row.get("total_capacity")?,
        tickets_sold: row.get("tickets_sold")?,
        tickets_remaining: row.get("tickets_remaining")?,
        event_start_time: parse_offset_time(row, "event_start_time")?,
        event_end_time: parse_offset_time(row, "event_end_time")?,
        source_tag,
    };

    Ok(StoredEvent {
        record,
        time_added: parse_utc_time(row, "time_added")?,
        time_updated: parse_utc_time(row, "time_updated")?,
    })
}
