//! Library root for `ticket-triage-bot`.
//!
//! Ticket-triage-bot is an LLM-powered assistant for issue trackers designed to:
//! - Poll the tracker for new tickets
//! - Triage short or non-bug tickets, and suggest a root cause for detailed bug reports
//! - Point out previously seen tickets that look similar
//! - Post all of the above as a single comment on the ticket
//!
//! The bot integrates with Jira for tickets and with Ollama or OpenAI for
//! language model calls. The architecture is built around extensible traits
//! that allow for different implementations of each service.

pub mod base;
pub mod runtime;
pub mod service;
pub mod triage;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::{info, warn};

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the triage bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with tracker and LLM clients
/// - Polls for new tickets until Ctrl-C
pub async fn start(config: Config) -> Void {
    info!("Starting ticket-triage-bot ...");

    // Start the crypto provider.
    if crypto::ring::default_provider().install_default().is_err() {
        warn!("A crypto provider was already installed.");
    }

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    tokio::select! {
        result = runtime.start() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down ...");
            Ok(())
        }
    }
}
