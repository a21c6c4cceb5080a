use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging for the binary. `RUST_LOG` overrides the default
/// `event_scrape=info` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("event_scrape=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
