//! Polls the tracker and drives the triage pipeline for each new ticket.

use std::time::Duration;

use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{NewTicket, ProcessedSet, Res, Ticket, Void},
    },
    service::{llm::LlmClient, tracker::TrackerClient},
    triage::{analyzer::TicketAnalyzer, formatter::Formatter, similarity::SimilarityChecker},
};

/// Characters of a posted comment echoed to the log.
const COMMENT_LOG_PREVIEW_CHARS: usize = 100;

/// The triage bot: one instance per process.
///
/// Tickets are handled one at a time; a ticket is marked processed only once
/// its comment has been attempted.
pub struct TriageBot {
    tracker: TrackerClient,
    similarity: SimilarityChecker,
    analyzer: TicketAnalyzer,
    processed: ProcessedSet,
    filter: String,
    base_url: String,
}

impl TriageBot {
    pub fn new(config: &Config, tracker: TrackerClient, llm: LlmClient) -> Self {
        Self {
            tracker,
            similarity: SimilarityChecker::new(llm.clone(), config.similarity_prompt.clone()),
            analyzer: TicketAnalyzer::new(llm, Formatter::default(), config.root_cause_prompt.clone(), config.initial_triage_prompt.clone()),
            processed: ProcessedSet::new(),
            filter: config.jql_filter.clone(),
            base_url: config.jira_url.clone(),
        }
    }

    /// Tickets commented on so far.
    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// Tickets known to the similarity store.
    pub fn known_tickets(&self) -> &[Ticket] {
        self.similarity.tickets()
    }

    /// Create a ticket in the tracker and triage it right away.
    ///
    /// Only a creation failure is returned. A triage failure is logged and
    /// the ticket is left for the next poll.
    #[instrument(skip_all)]
    pub async fn create_ticket(&mut self, new_ticket: &NewTicket) -> Res<Ticket> {
        let ticket = self.tracker.create_ticket(new_ticket).await?;

        if let Err(err) = self.process_ticket(&ticket).await {
            error!("Error processing ticket {}: {}", ticket.id, err);
        }

        Ok(ticket)
    }

    /// Run one poll: triage every matching ticket not yet commented on.
    ///
    /// A failure on one ticket is logged and does not stop the others; that
    /// ticket is retried on the next poll.
    #[instrument(skip_all)]
    pub async fn process_new_tickets(&mut self) -> Void {
        let tickets = self.tracker.get_tickets(&self.filter).await?;

        debug!("Fetched {} tickets.", tickets.len());

        for ticket in tickets {
            if self.processed.contains(&ticket.id) {
                continue;
            }

            match self.tracker.has_bot_comment(&ticket.id).await {
                Ok(true) => {
                    debug!("Ticket {} already has a bot comment.", ticket.id);
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    error!("Error checking comments on ticket {}: {}", ticket.id, err);
                    continue;
                }
            }

            info!("Processing new ticket {}: {}", ticket.id, ticket.summary);

            if let Err(err) = self.process_ticket(&ticket).await {
                error!("Error processing ticket {}: {}", ticket.id, err);
            }
        }

        Ok(())
    }

    /// Poll forever, sleeping `poll_interval` after every pass.
    ///
    /// Errors from a pass are logged; they never end the loop.
    pub async fn run(&mut self, poll_interval: Duration) {
        info!("Starting triage bot ...");

        loop {
            if let Err(err) = self.process_new_tickets().await {
                error!("Error: {}", err);
            }

            info!("Waiting {} seconds before next check ...", poll_interval.as_secs());
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Triage one ticket and post the comment.
    async fn process_ticket(&mut self, ticket: &Ticket) -> Void {
        let logs = self.tracker.fetch_attachment_content(&ticket.id).await?;

        self.similarity.add_ticket(ticket.clone());
        let similar = self.similarity.find_similar_tickets(ticket, &self.base_url).await;

        let comment = self.analyzer.analyze_ticket(ticket, &logs, &similar, &self.base_url).await;

        match self.tracker.add_comment(&ticket.id, &comment).await {
            Ok(()) => {
                let preview = comment.chars().take(COMMENT_LOG_PREVIEW_CHARS).collect::<String>();
                info!("Commented on ticket {}: {}...", ticket.id, preview);
            }
            Err(err) => error!("Error adding comment to ticket {}: {}", ticket.id, err),
        }

        self.processed.insert(&ticket.id);

        Ok(())
    }
}
