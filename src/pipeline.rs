use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use rand::Rng;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::EventSink;
use crate::models::EventRecord;
use crate::scraping::assemble::{assemble, AssembleError};
use crate::scraping::fields::extract_fields;
use crate::scraping::page::{fetch_page, HtmlPage, PageAccessor};
use crate::scraping::SourceProfile;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("page load failed: {0:#}")]
    Load(anyhow::Error),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error("cancelled before {0}")]
    Cancelled(&'static str),
    #[error("step budget exhausted before {0}")]
    TimedOut(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cooperative bound on one page's work. Checked between steps, so a single
/// step is never interrupted, but nothing new starts once it trips.
#[derive(Debug, Clone)]
pub struct StepGuard {
    deadline: Option<Instant>,
    cancel: CancelFlag,
}

impl StepGuard {
    pub fn new(budget: Duration, cancel: CancelFlag) -> Self {
        Self {
            deadline: Instant::now().checked_add(budget),
            cancel,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            cancel: CancelFlag::default(),
        }
    }

    pub fn check(&self, step: &'static str) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled(step));
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(PipelineError::TimedOut(step)),
            _ => Ok(()),
        }
    }
}

/// Random delay between navigations.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let (min_ms, max_ms) = config.pacing_range();
        Self::new(min_ms, max_ms)
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn next_delay(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    pub fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Produces a loaded page for a URL.
pub trait PageLoader {
    fn load(&self, url: &str) -> anyhow::Result<HtmlPage>;
}

pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageLoader for HttpLoader {
    fn load(&self, url: &str) -> anyhow::Result<HtmlPage> {
        fetch_page(&self.client, url)
    }
}

/// Fields, then the embedded payload, then assembly; the guard is consulted
/// before each.
pub fn process_page(
    page: &dyn PageAccessor,
    profile: &SourceProfile,
    guard: &StepGuard,
) -> Result<EventRecord, PipelineError> {
    guard.check("field extraction")?;
    let bag = extract_fields(page, profile.locators);

    guard.check("sideband extraction")?;
    let sideband = profile.read_sideband(page);

    guard.check("assembly")?;
    Ok(assemble(profile, bag, sideband)?)
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub stored: Vec<String>,
    pub rejected: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub cancelled: bool,
}

pub struct Batch<'a> {
    pub profile: &'a SourceProfile,
    pub loader: &'a dyn PageLoader,
    pub pacer: Pacer,
    pub step_budget: Duration,
    pub cancel: CancelFlag,
}

impl Batch<'_> {
    /// Visits each URL in order, one at a time. Per-URL failures are
    /// recorded and the batch moves on; cancellation stops it.
    pub fn run(&self, urls: &[String], sink: &mut dyn EventSink) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, url) in urls.iter().enumerate() {
            if index > 0 {
                self.pacer.pause();
            }
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let guard = StepGuard::new(self.step_budget, self.cancel.clone());
            let result = self
                .loader
                .load(url)
                .map_err(PipelineError::Load)
                .and_then(|page| process_page(&page, self.profile, &guard));

            match result {
                Ok(record) => {
                    if sink.upsert(&record) {
                        info!(source = self.profile.id, page_url = %record.page_url, "stored {}", record.display_title());
                        report.stored.push(record.page_url);
                    } else {
                        report.rejected.push(record.page_url);
                    }
                }
                Err(PipelineError::Cancelled(step)) => {
                    warn!(url = %url, "cancelled before {step}");
                    report.cancelled = true;
                    break;
                }
                Err(err) => {
                    warn!(source = self.profile.id, url = %url, "event skipped: {err}");
                    report.failed.push((url.clone(), err.to_string()));
                }
            }
        }

        report
    }
}
