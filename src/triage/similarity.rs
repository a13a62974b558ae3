//! Finds previously seen tickets that resemble a new one.
//!
//! The model is asked to compare tickets and answers in free text. That text
//! is parsed as a small line-oriented protocol:
//!
//! - a reply starting with `http` is a single link to a highly similar ticket;
//! - otherwise every line starting with `-` must look like
//!   `- [ABC-1]: Login fails (Similarity: 0.85)`.
//!
//! Lines that do not match are skipped with a warning; they never fail the batch.

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        prompts::BASE_INSTRUCTIONS,
        types::{SimilarityCandidate, Ticket},
    },
    service::llm::LlmClient,
    triage::formatter::render_template,
};

/// Summary given to the single candidate of a link reply.
pub const LINK_REPLY_SUMMARY: &str = "Highly similar ticket";

/// Score given to the single candidate of a link reply.
pub const LINK_REPLY_SIMILARITY: f64 = 0.95;

/// Separates the summary from the score in a candidate line.
const SIMILARITY_MARKER: &str = "(Similarity:";

/// Why a candidate line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("missing `:` after the ticket id")]
    MissingColon,
    #[error("missing `(Similarity:` marker")]
    MissingMarker,
    #[error("malformed ticket id `{0}`")]
    BadTicketId(String),
    #[error("malformed similarity score `{0}`")]
    BadScore(String),
}

/// Parse one `- [ID]: summary (Similarity: score)` line.
///
/// The caller decides which lines are candidate lines; this only checks the grammar.
pub fn parse_candidate_line(line: &str) -> Result<SimilarityCandidate, LineError> {
    let (id_part, rest) = line.split_once(':').ok_or(LineError::MissingColon)?;

    let ticket_id = id_part.trim_matches(|c: char| matches!(c, '-' | ' ' | '[' | ']')).trim();
    if ticket_id.is_empty() || ticket_id.contains(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')')) {
        return Err(LineError::BadTicketId(id_part.to_string()));
    }

    let (summary, score) = rest.split_once(SIMILARITY_MARKER).ok_or(LineError::MissingMarker)?;

    let score = score.trim().trim_end_matches(')').trim();
    let similarity = score.parse::<f64>().map_err(|_| LineError::BadScore(score.to_string()))?;
    if !similarity.is_finite() || !(0.0..=1.0).contains(&similarity) {
        return Err(LineError::BadScore(score.to_string()));
    }

    Ok(SimilarityCandidate {
        ticket_id: ticket_id.to_string(),
        summary: summary.trim().to_string(),
        similarity,
    })
}

/// Parse a whole model reply into candidates.
///
/// For a link reply the ticket id is the last path segment of the first
/// whitespace-delimited token. Candidates naming `exclude_id` are dropped.
pub fn parse_similarity_reply(reply: &str, exclude_id: &str) -> Vec<SimilarityCandidate> {
    let reply = reply.trim();

    if reply.starts_with("http") {
        // Only the first token is the link; any trailing prose is ignored.
        let link = reply.split_whitespace().next().unwrap_or_default();
        let ticket_id = link.rsplit('/').next().unwrap_or_default();

        if ticket_id.is_empty() {
            warn!("Similarity reply link has no ticket id: {}", reply);
            return Vec::new();
        }

        if ticket_id == exclude_id {
            warn!("Similarity reply links the ticket to itself; ignoring.");
            return Vec::new();
        }

        return vec![SimilarityCandidate {
            ticket_id: ticket_id.to_string(),
            summary: LINK_REPLY_SUMMARY.to_string(),
            similarity: LINK_REPLY_SIMILARITY,
        }];
    }

    reply
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .filter_map(|line| match parse_candidate_line(line) {
            Ok(candidate) => Some(candidate),
            Err(err) => {
                warn!("Error parsing similarity response line `{}`: {}", line, err);
                None
            }
        })
        .filter(|candidate| candidate.ticket_id != exclude_id)
        .collect()
}

/// Keeps every ticket seen so far and asks the model which ones resemble a new ticket.
pub struct SimilarityChecker {
    llm: LlmClient,
    prompt_template: String,
    tickets: Vec<Ticket>,
}

impl SimilarityChecker {
    pub fn new(llm: LlmClient, prompt_template: impl Into<String>) -> Self {
        Self {
            llm,
            prompt_template: prompt_template.into(),
            tickets: Vec::new(),
        }
    }

    /// Add a ticket to the store; the store is append-only.
    pub fn add_ticket(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
    }

    /// All stored tickets, in insertion order.
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Describe every stored ticket except `exclude_id`, for the prompt.
    pub fn build_corpus(&self, exclude_id: &str) -> String {
        self.tickets
            .iter()
            .filter(|t| t.id != exclude_id)
            .map(|t| format!("{}: Summary - '{}', Description - '{}'", t.id, t.summary, t.description))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn build_prompt(&self, new_ticket: &Ticket) -> String {
        let corpus = self.build_corpus(&new_ticket.id);

        render_template(
            &self.prompt_template,
            &[
                ("base_instructions", BASE_INSTRUCTIONS),
                ("new_ticket_id", &new_ticket.id),
                ("new_ticket_summary", &new_ticket.summary),
                ("new_ticket_description", &new_ticket.description),
                ("existing_tickets", &corpus),
            ],
        )
    }

    /// Ask the model for tickets similar to `new_ticket`.
    ///
    /// Never fails: a model error yields an empty list. `_base_url` is unused
    /// here; links are built when formatting.
    #[instrument(skip_all, fields(ticket_id = %new_ticket.id))]
    pub async fn find_similar_tickets(&self, new_ticket: &Ticket, _base_url: &str) -> Vec<SimilarityCandidate> {
        let prompt = self.build_prompt(new_ticket);

        let reply = match self.llm.invoke(&prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("Error in similarity check for ticket {}: {}", new_ticket.id, err);
                return Vec::new();
            }
        };

        let candidates = parse_similarity_reply(&reply, &new_ticket.id);

        info!("Found {} similar ticket candidates.", candidates.len());

        candidates
    }
}
