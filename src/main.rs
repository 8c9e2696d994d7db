//! Stock support chat client
//!
//! Terminal chat front-end for a stock-trading support backend. A single
//! session state machine owns the transcript; a periodic health probe keeps
//! the connectivity banner current.

mod backend;
mod config;
mod conversation;
mod runtime;
mod state_machine;
mod tui;

use backend::{HttpBackend, LoggingBackend};
use config::ClientConfig;
use runtime::SessionHandle;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tui::Tui;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;

    // The terminal belongs to the UI, so logs go to a file
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    tracing::info!(
        backend = %config.backend_url,
        probe_interval_secs = config.probe_interval.as_secs(),
        "Starting stock chat client"
    );

    let backend = LoggingBackend::new(HttpBackend::new(&config.backend_url));
    let session = SessionHandle::start(backend, config.probe_interval);

    let mut tui = Tui::init()?;
    let result = tui.run(&session).await;
    tui.restore()?;

    session.shutdown().await;
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
