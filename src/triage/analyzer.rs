//! Decides how to analyze a ticket, asks the model, and renders the comment.

use tracing::{error, info, instrument};

use crate::{
    base::{
        prompts::{BASE_INSTRUCTIONS, DEFAULT_INSIGHTS, DEFAULT_TEAM, NO_LOGS_PLACEHOLDER, UNCLEAR_MODEL_REPLY},
        types::{SimilarityCandidate, Ticket},
    },
    service::llm::LlmClient,
    triage::formatter::{Formatter, render_template},
};

/// Descriptions shorter than this (in characters) only get an initial triage.
pub const MIN_ROOT_CAUSE_DESCRIPTION_CHARS: usize = 50;

/// The kind of analysis a ticket receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    /// Nothing to analyze; the fixed fallback text is used.
    Unclear,
    InitialTriage,
    RootCause,
}

impl Analysis {
    /// Pick the analysis for a ticket and its logs.
    pub fn decide(ticket: &Ticket, logs: &str) -> Self {
        if ticket.description.is_empty() && logs.is_empty() {
            return Analysis::Unclear;
        }

        if ticket.description.chars().count() < MIN_ROOT_CAUSE_DESCRIPTION_CHARS || !ticket.issue_type.is_root_cause_eligible() {
            Analysis::InitialTriage
        } else {
            Analysis::RootCause
        }
    }
}

/// Split a reply at its first newline, falling back to `default` for the second part.
fn split_reply<'a>(reply: &'a str, default: &'a str) -> (&'a str, &'a str) {
    reply.split_once('\n').unwrap_or((reply, default))
}

/// Produces the comment text for a ticket.
#[derive(Clone)]
pub struct TicketAnalyzer {
    llm: LlmClient,
    formatter: Formatter,
    root_cause_prompt: String,
    initial_triage_prompt: String,
}

impl TicketAnalyzer {
    pub fn new(llm: LlmClient, formatter: Formatter, root_cause_prompt: impl Into<String>, initial_triage_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            formatter,
            root_cause_prompt: root_cause_prompt.into(),
            initial_triage_prompt: initial_triage_prompt.into(),
        }
    }

    /// Build the full comment: greeting, analysis, and similar tickets.
    ///
    /// Never fails; model errors fall back to the unclear-issue text.
    #[instrument(skip_all, fields(ticket_id = %ticket.id))]
    pub async fn analyze_ticket(&self, ticket: &Ticket, logs: &str, similar: &[SimilarityCandidate], base_url: &str) -> String {
        let analysis = Analysis::decide(ticket, logs);

        info!("Performing {:?} analysis.", analysis);

        let analysis_text = match analysis {
            Analysis::Unclear => self.formatter.unclear_issue().to_string(),
            Analysis::InitialTriage => self.perform_initial_triage(ticket).await,
            Analysis::RootCause => self.perform_root_cause_analysis(ticket, logs).await,
        };

        let similar_section = self.formatter.format_similar_tickets(similar, base_url);

        self.formatter.format_final_response(self.formatter.greeting(), &analysis_text, &similar_section)
    }

    async fn perform_root_cause_analysis(&self, ticket: &Ticket, logs: &str) -> String {
        let prompt_logs = if logs.is_empty() { NO_LOGS_PLACEHOLDER } else { logs };
        let prompt = render_template(
            &self.root_cause_prompt,
            &[("base_instructions", BASE_INSTRUCTIONS), ("description", &ticket.description), ("logs", prompt_logs)],
        );

        let reply = match self.llm.invoke(&prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("Error analyzing ticket {}: {}", ticket.id, err);
                return self.formatter.unclear_issue().to_string();
            }
        };

        let reply = reply.trim();
        if reply == UNCLEAR_MODEL_REPLY {
            return self.formatter.unclear_issue().to_string();
        }

        let (root_cause, insights) = split_reply(reply, DEFAULT_INSIGHTS);

        self.formatter.format_root_cause(&ticket.id, logs, root_cause, insights)
    }

    async fn perform_initial_triage(&self, ticket: &Ticket) -> String {
        let prompt = render_template(&self.initial_triage_prompt, &[("base_instructions", BASE_INSTRUCTIONS), ("description", &ticket.description)]);

        let reply = match self.llm.invoke(&prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("Error triaging ticket {}: {}", ticket.id, err);
                return self.formatter.unclear_issue().to_string();
            }
        };

        let (summary, team) = split_reply(reply.trim(), DEFAULT_TEAM);

        self.formatter.format_initial_triage(&ticket.id, summary, team)
    }
}
