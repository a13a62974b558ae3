//! Runtime services and shared state for the triage bot.

use std::time::Duration;

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{llm::LlmClient, tracker::TrackerClient},
    triage::bot::TriageBot,
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the tracker client, LLM client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The tracker client instance.
    pub tracker: TrackerClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the LLM client.
        let llm = LlmClient::from_config(&config)?;

        // Initialize the tracker client.
        let tracker = TrackerClient::jira(&config)?;

        Ok(Self { config, llm, tracker })
    }

    /// Build a bot over this runtime's services.
    pub fn bot(&self) -> TriageBot {
        TriageBot::new(&self.config, self.tracker.clone(), self.llm.clone())
    }

    /// Poll the tracker until the process is stopped.
    pub async fn start(&self) -> Void {
        let mut bot = self.bot();

        bot.run(Duration::from_secs(self.config.poll_interval_secs)).await;

        Ok(())
    }
}
