use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use event_scrape::logging::init_logging;
use event_scrape::pipeline::HttpLoader;
use event_scrape::scraping::page::build_client;
use event_scrape::{
    find_profile, list_sources, AppConfig, Batch, CancelFlag, Pacer, Store, StoredEvent,
};

#[derive(Parser)]
#[command(name = "event-scrape")]
#[command(about = "Extract Eventbrite and Meetup event pages into SQLite", long_about = None)]
struct Cli {
    /// Database file (defaults to the configured path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported sources
    Sources,
    /// Write the effective configuration to the config file
    InitConfig,
    /// Fetch event pages, extract them and upsert the results
    Scrape {
        /// Source id: eventbrite or meetup
        #[arg(long)]
        source: String,
        /// Event page URLs, visited in order
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print one stored event as JSON
    Show { page_url: String },
    /// List events that have not ended yet
    Active,
    /// List active events around a point
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, default_value_t = 2.0)]
        miles: f64,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());

    match cli.command {
        Commands::Sources => {
            println!("{}", serde_json::to_string_pretty(&list_sources())?);
            Ok(())
        }
        Commands::InitConfig => {
            let path = config.save()?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Scrape { source, urls } => scrape(&config, &db_path, &source, &urls),
        Commands::Show { page_url } => {
            let store = open_store(&db_path)?;
            let event = store
                .get_event(&page_url)?
                .ok_or_else(|| anyhow!("no stored event for {page_url}"))?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        Commands::Active => {
            let store = open_store(&db_path)?;
            print_events(&store.list_active_events(Utc::now())?)
        }
        Commands::Nearby { lat, lng, miles } => {
            let store = open_store(&db_path)?;
            print_events(&store.list_events_within_radius(lat, lng, miles, Utc::now())?)
        }
    }
}

fn open_store(path: &Path) -> Result<Store> {
    Store::open(path).with_context(|| format!("unable to open database {}", path.display()))
}

fn scrape(config: &AppConfig, db_path: &Path, source: &str, urls: &[String]) -> Result<()> {
    let profile = find_profile(source).ok_or_else(|| anyhow!("unknown source: {source}"))?;
    let loader = HttpLoader::new(build_client(config)?);
    let mut store = open_store(db_path)?;

    let batch = Batch {
        profile,
        loader: &loader,
        pacer: Pacer::from_config(config),
        step_budget: config.step_timeout(),
        // The CLI never raises this; Ctrl-C terminates the process outright.
        cancel: CancelFlag::default(),
    };
    let report = batch.run(urls, &mut store);

    println!(
        "Completed: {}/{} events stored ({} rejected, {} failed)",
        report.stored.len(),
        urls.len(),
        report.rejected.len(),
        report.failed.len()
    );
    for (url, reason) in &report.failed {
        println!("  {url}: {reason}");
    }
    Ok(())
}

fn print_events(events: &[StoredEvent]) -> Result<()> {
    for event in events {
        let record = &event.record;
        println!(
            "{} | {} | {}",
            record.display_title(),
            record.date_time.as_deref().unwrap_or("-"),
            record.page_url
        );
    }
    println!("{} events", events.len());
    Ok(())
}
