//! Prompt templates for LLM usage.
//!
//! Placeholders are written as `{name}` and filled by
//! [`render_template`](crate::triage::formatter::render_template).

/// Shared preamble for every prompt.
pub const BASE_INSTRUCTIONS: &str = r#####"You are an assistant that analyzes tickets in an issue tracker.  Your primary goal is to write responses that are clear, concise, and helpful, without sounding like an automated bot.  Focus on providing actionable insights."#####;

/// Root cause analysis prompt.
///
/// Placeholders: `{base_instructions}`, `{description}`, `{logs}`.
pub const ROOT_CAUSE_PROMPT: &str = r#####"{base_instructions}

Analyze the ticket with the following details:
- Description: '{description}'
- Error Logs: '{logs}'

Suggest a concise root cause for the issue on the first line, then provide one or two short, actionable insights or next steps on the following lines.  If the issue is unclear, return exactly: 'The issue is unclear.'"#####;

/// Initial triage prompt.
///
/// Placeholders: `{base_instructions}`, `{description}`.
pub const INITIAL_TRIAGE_PROMPT: &str = r#####"{base_instructions}

Summarize the core problem described in the ticket with the following details:
- Description: '{description}'

Put the summary on the first line.  On the second line, suggest the most likely team or component responsible.  Keep it brief and to the point."#####;

/// Similarity check prompt.
///
/// Placeholders: `{base_instructions}`, `{new_ticket_id}`, `{new_ticket_summary}`,
/// `{new_ticket_description}`, `{existing_tickets}`.
pub const SIMILARITY_PROMPT: &str = r#####"{base_instructions}

Perform a similarity check for the new ticket with ID '{new_ticket_id}' based on its summary and description.  First, compare the summary: '{new_ticket_summary}'.  Then, if needed, delve into the description: '{new_ticket_description}'.

Compare this with the summaries and descriptions of the existing tickets, provided in the following format: '{existing_tickets}'.

Exclude the ticket with ID '{new_ticket_id}' from the comparison to avoid matching the ticket with itself.

Identify if a highly similar ticket exists (e.g., similarity score above 0.9 for summary, or above 0.7 for description if the summary is not highly similar).

If a highly similar ticket is found, output only its link and nothing else.

If no highly similar ticket is found, list up to 3 of the most similar tickets, one per line, using exactly this format:
- [TICKET-ID]: summary (Similarity: 0.00)"#####;

/// Placeholder used in place of empty logs.
pub const NO_LOGS_PLACEHOLDER: &str = "No error logs attached.";

/// The exact reply the model gives when it cannot determine a root cause.
pub const UNCLEAR_MODEL_REPLY: &str = "The issue is unclear.";

/// Team suggested when the triage reply has no second line.
pub const DEFAULT_TEAM: &str = "Development Team";

/// Insights used when the root cause reply has no second line.
pub const DEFAULT_INSIGHTS: &str = "Please verify the suggested cause.";
