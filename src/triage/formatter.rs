//! Renders the analysis and similar-ticket sections into the final comment text.
//!
//! Every function here is total: inputs are already validated upstream, so
//! formatting never fails.

use std::cmp::Ordering;

use crate::base::{prompts::NO_LOGS_PLACEHOLDER, types::SimilarityCandidate};

/// Scores strictly above this produce the "highly similar" block.
pub const HIGHLY_SIMILAR_THRESHOLD: f64 = 0.9;

/// Maximum number of candidates listed when nothing is highly similar.
pub const MAX_LISTED_CANDIDATES: usize = 3;

/// Greeting opening every comment.
pub const GREETING_TEMPLATE: &str = "Hello,\n\nThank you for raising this ticket. Below is our initial analysis to assist with resolving the issue.\n\n";

/// Placeholders: `{ticket_id}`, `{logs}`, `{root_cause}`, `{insights}`.
pub const ROOT_CAUSE_TEMPLATE: &str = "--- AI Bot Ticket Analysis ---\n*Ticket:* {ticket_id}\n*Error Logs:* {logs}\n\n*Root Cause:* {root_cause}\n\n*Actionable Insights:*\n{insights}\n";

/// Placeholders: `{ticket_id}`, `{summary}`, `{team}`.
pub const INITIAL_TRIAGE_TEMPLATE: &str = "--- AI Bot Ticket Triage ---\n*Ticket:* {ticket_id}\n*Summary:* {summary}\n*Suggested Team/Component:* {team}\n";

/// Fallback analysis when the ticket cannot be understood.
pub const UNCLEAR_ISSUE_TEMPLATE: &str =
    "The issue is unclear based on the provided details. Our team will investigate further and respond soon. Thank you for your patience.";

/// Placeholders: `{similar_tickets}`.
pub const SIMILAR_TICKETS_TEMPLATE: &str = "\n*Similar Tickets:*\nFor additional context, you may review the following similar tickets:\n{similar_tickets}\n";

/// Placeholders: `{link}`.
pub const HIGHLY_SIMILAR_TICKET_TEMPLATE: &str = "\n*Similar Issue Found:*\nThis issue appears to be very similar to an existing ticket. Please refer to: {link}\n";

/// The layout strings used by the [`Formatter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub greeting: String,
    pub root_cause: String,
    pub initial_triage: String,
    pub unclear_issue: String,
    pub similar_tickets: String,
    pub highly_similar_ticket: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            greeting: GREETING_TEMPLATE.to_string(),
            root_cause: ROOT_CAUSE_TEMPLATE.to_string(),
            initial_triage: INITIAL_TRIAGE_TEMPLATE.to_string(),
            unclear_issue: UNCLEAR_ISSUE_TEMPLATE.to_string(),
            similar_tickets: SIMILAR_TICKETS_TEMPLATE.to_string(),
            highly_similar_ticket: HIGHLY_SIMILAR_TICKET_TEMPLATE.to_string(),
        }
    }
}

/// Fill `{name}` placeholders from `vars`.
///
/// Substitution happens in one left-to-right pass, so text inserted for one
/// placeholder is never expanded again. Unknown placeholders stay verbatim.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let value = after
            .find('}')
            .and_then(|end| vars.iter().find(|(name, _)| *name == &after[..end]).map(|(_, value)| (end, *value)));

        match value {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Build the browse link for a ticket.
pub fn ticket_link(base_url: &str, ticket_id: &str) -> String {
    format!("{}/browse/{}", base_url.trim_end_matches('/'), ticket_id)
}

/// Renders comment sections from pre-computed values.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    templates: Templates,
}

impl Formatter {
    /// A formatter with custom layout strings.
    pub fn new(templates: Templates) -> Self {
        Self { templates }
    }

    /// The greeting placed at the top of every comment.
    pub fn greeting(&self) -> &str {
        &self.templates.greeting
    }

    /// The fallback analysis for tickets that cannot be understood.
    pub fn unclear_issue(&self) -> &str {
        &self.templates.unclear_issue
    }

    pub fn format_root_cause(&self, ticket_id: &str, logs: &str, root_cause: &str, insights: &str) -> String {
        let logs = if logs.is_empty() { NO_LOGS_PLACEHOLDER } else { logs };

        render_template(
            &self.templates.root_cause,
            &[("ticket_id", ticket_id), ("logs", logs), ("root_cause", root_cause), ("insights", insights)],
        )
    }

    pub fn format_initial_triage(&self, ticket_id: &str, summary: &str, team: &str) -> String {
        render_template(&self.templates.initial_triage, &[("ticket_id", ticket_id), ("summary", summary), ("team", team)])
    }

    /// Render the similar-tickets section.
    ///
    /// Candidates are ranked by score, highest first. If the best score is above
    /// [`HIGHLY_SIMILAR_THRESHOLD`], only a link to that ticket is emitted;
    /// otherwise the top [`MAX_LISTED_CANDIDATES`] are listed. An empty input
    /// yields an empty string.
    pub fn format_similar_tickets(&self, candidates: &[SimilarityCandidate], base_url: &str) -> String {
        let mut ranked = candidates.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));

        let Some(top) = ranked.first() else {
            return String::new();
        };

        if top.similarity > HIGHLY_SIMILAR_THRESHOLD {
            let link = ticket_link(base_url, &top.ticket_id);
            return render_template(&self.templates.highly_similar_ticket, &[("link", &link)]);
        }

        let lines = ranked
            .iter()
            .take(MAX_LISTED_CANDIDATES)
            .map(|c| format!("- [{}]({}): {} (Similarity: {:.2})", c.ticket_id, ticket_link(base_url, &c.ticket_id), c.summary, c.similarity))
            .collect::<Vec<_>>()
            .join("\n");

        render_template(&self.templates.similar_tickets, &[("similar_tickets", &lines)])
    }

    pub fn format_final_response(&self, greeting: &str, analysis: &str, similar_section: &str) -> String {
        format!("{greeting}{analysis}{similar_section}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_URL: &str = "https://tracker.example";

    fn candidate(id: &str, summary: &str, similarity: f64) -> SimilarityCandidate {
        SimilarityCandidate {
            ticket_id: id.to_string(),
            summary: summary.to_string(),
            similarity,
        }
    }

    #[test]
    fn test_render_template_fills_known_placeholders() {
        let rendered = render_template("{a} and {b} but not {c}", &[("a", "one"), ("b", "two")]);
        assert_eq!(rendered, "one and two but not {c}");
    }

    #[test]
    fn test_render_template_does_not_reexpand_values() {
        let rendered = render_template("{logs} / {ticket_id}", &[("logs", "{ticket_id}"), ("ticket_id", "ABC-1")]);
        assert_eq!(rendered, "{ticket_id} / ABC-1");
    }

    #[test]
    fn test_render_template_handles_stray_braces() {
        assert_eq!(render_template("fn main() { {x} }", &[("x", "1")]), "fn main() { 1 }");
        assert_eq!(render_template("unclosed {x", &[("x", "1")]), "unclosed {x");
    }

    #[test]
    fn test_format_root_cause() {
        let formatter = Formatter::default();
        let text = formatter.format_root_cause("ABC-1", "NullPointerException at line 4", "Missing null check", "Add a guard.");

        assert_eq!(
            text,
            "--- AI Bot Ticket Analysis ---\n*Ticket:* ABC-1\n*Error Logs:* NullPointerException at line 4\n\n*Root Cause:* Missing null check\n\n*Actionable Insights:*\nAdd a guard.\n"
        );
    }

    #[test]
    fn test_format_root_cause_without_logs() {
        let formatter = Formatter::default();
        let text = formatter.format_root_cause("ABC-1", "", "Cause", "Insight");

        assert!(text.contains("*Error Logs:* No error logs attached.\n"));
    }

    #[test]
    fn test_format_initial_triage() {
        let formatter = Formatter::default();
        let text = formatter.format_initial_triage("ABC-2", "Login page is slow", "Auth Team");

        assert_eq!(text, "--- AI Bot Ticket Triage ---\n*Ticket:* ABC-2\n*Summary:* Login page is slow\n*Suggested Team/Component:* Auth Team\n");
    }

    #[test]
    fn test_format_similar_tickets_empty() {
        assert_eq!(Formatter::default().format_similar_tickets(&[], BASE_URL), "");
    }

    #[test]
    fn test_format_similar_tickets_highly_similar() {
        let candidates = vec![candidate("ABC-1", "Login fails", 0.5), candidate("ABC-7", "Login broken", 0.95)];
        let text = Formatter::default().format_similar_tickets(&candidates, BASE_URL);

        assert_eq!(
            text,
            "\n*Similar Issue Found:*\nThis issue appears to be very similar to an existing ticket. Please refer to: https://tracker.example/browse/ABC-7\n"
        );
    }

    #[test]
    fn test_format_similar_tickets_threshold_is_strict() {
        let candidates = vec![candidate("ABC-1", "Login fails", 0.9)];
        let text = Formatter::default().format_similar_tickets(&candidates, BASE_URL);

        assert!(text.starts_with("\n*Similar Tickets:*\n"));
        assert!(text.contains("- [ABC-1](https://tracker.example/browse/ABC-1): Login fails (Similarity: 0.90)"));
    }

    #[test]
    fn test_format_similar_tickets_lists_top_three_descending() {
        let candidates = vec![
            candidate("ABC-1", "One", 0.10),
            candidate("ABC-2", "Two", 0.80),
            candidate("ABC-3", "Three", 0.40),
            candidate("ABC-4", "Four", 0.60),
        ];
        let text = Formatter::default().format_similar_tickets(&candidates, "https://tracker.example/");

        let expected = "\n*Similar Tickets:*\nFor additional context, you may review the following similar tickets:\n\
            - [ABC-2](https://tracker.example/browse/ABC-2): Two (Similarity: 0.80)\n\
            - [ABC-4](https://tracker.example/browse/ABC-4): Four (Similarity: 0.60)\n\
            - [ABC-3](https://tracker.example/browse/ABC-3): Three (Similarity: 0.40)\n";

        assert_eq!(text, expected);
        assert!(!text.contains("ABC-1"));
    }

    #[test]
    fn test_format_similar_tickets_rounds_to_two_places() {
        let candidates = vec![candidate("ABC-1", "One", 0.856)];
        let text = Formatter::default().format_similar_tickets(&candidates, BASE_URL);

        assert!(text.contains("(Similarity: 0.86)"));
    }

    #[test]
    fn test_format_final_response_concatenates_in_order() {
        let formatter = Formatter::default();
        let text = formatter.format_final_response(formatter.greeting(), "ANALYSIS", "SIMILAR");

        assert!(text.starts_with("Hello,\n\n"));
        assert!(text.ends_with("ANALYSISSIMILAR"));
        assert_eq!(formatter.format_final_response("a", "b", ""), "ab");
    }

    #[test]
    fn test_custom_templates() {
        let formatter = Formatter::new(Templates {
            greeting: "Hi.\n".to_string(),
            initial_triage: "[{ticket_id}] {summary} -> {team}\n".to_string(),
            highly_similar_ticket: "Duplicate of {link}\n".to_string(),
            ..Templates::default()
        });

        assert_eq!(formatter.greeting(), "Hi.\n");
        assert_eq!(formatter.format_initial_triage("ABC-1", "Login fails", "Auth"), "[ABC-1] Login fails -> Auth\n");
        assert_eq!(
            formatter.format_similar_tickets(&[candidate("ABC-2", "Login fails", 0.97)], BASE_URL),
            "Duplicate of https://tracker.example/browse/ABC-2\n"
        );
        assert_eq!(formatter.unclear_issue(), UNCLEAR_ISSUE_TEMPLATE);
    }
}
