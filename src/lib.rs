pub mod bounds;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod scraping;
mod utils;

pub use bounds::{BoundsError, GeoBounds};
pub use config::{AppConfig, ConfigError};
pub use db::{EventSink, Store};
pub use models::{EmbeddedEvent, EventRecord, SourceTag, StoredEvent, TicketSummary};
pub use pipeline::{process_page, Batch, BatchReport, CancelFlag, Pacer, PipelineError, StepGuard};
pub use scraping::page::{HtmlPage, PageAccessor, PageError};
pub use scraping::{find_profile, list_sources, profile_for, SourceProfile};
