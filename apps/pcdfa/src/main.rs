//! # pcdfa - Incremental Prefix-Closed DFA Store
//!
//! The main binary for the pcdfa store.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │           apps/pcdfa (THE BINARY)         │
//! │                                           │
//! │   ┌─────────────┐     ┌───────────────┐   │
//! │   │    CLI      │────▶│  store file   │   │
//! │   │   (clap)    │     │  (canonical)  │   │
//! │   └──────┬──────┘     └───────────────┘   │
//! │          ▼                                │
//! │   ┌───────────────┐                       │
//! │   │  pcdfa-core   │                       │
//! │   │ (THE LOGIC)   │                       │
//! │   └───────────────┘                       │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! pcdfa init --alphabet abc
//! pcdfa insert abc
//! pcdfa insert ac --reject
//! pcdfa lookup abc acb ab
//! pcdfa ingest -f facts.txt -t text
//! ```

use clap::Parser;
use pcdfa::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // PCDFA_LOG_FORMAT=json enables machine-parseable output.
    // Logs go to stderr so command output on stdout stays parseable.
    let log_format = std::env::var("PCDFA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pcdfa=info,pcdfa_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    eprintln!(
        "pcdfa v{} - accept, reject, or unknown. Never guesses.",
        env!("CARGO_PKG_VERSION")
    );
}
