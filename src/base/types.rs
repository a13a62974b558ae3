use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// The issue type of a ticket, as reported by the tracker.
///
/// Only `Bug` and `Support` tickets are eligible for root-cause analysis; every
/// other type is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueType {
    Bug,
    Support,
    Other(String),
}

impl IssueType {
    /// Whether tickets of this type may receive a root-cause analysis.
    pub fn is_root_cause_eligible(&self) -> bool {
        matches!(self, IssueType::Bug | IssueType::Support)
    }
}

impl From<&str> for IssueType {
    fn from(value: &str) -> Self {
        match value {
            "Bug" => IssueType::Bug,
            "Support" => IssueType::Support,
            other => IssueType::Other(other.to_string()),
        }
    }
}

impl From<String> for IssueType {
    fn from(value: String) -> Self {
        IssueType::from(value.as_str())
    }
}

impl From<IssueType> for String {
    fn from(value: IssueType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueType::Bug => f.write_str("Bug"),
            IssueType::Support => f.write_str("Support"),
            IssueType::Other(name) => f.write_str(name),
        }
    }
}

/// A ticket read from the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker key (e.g., `ABC-123`).
    pub id: String,
    pub issue_type: IssueType,
    pub summary: String,
    /// Plain-text description; empty when the tracker has none.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp, exactly as the tracker formats it.
    #[serde(default)]
    pub created_at: String,
}

/// The fields needed to open a new ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub summary: String,
    pub description: String,
    pub issue_type: IssueType,
    pub project_key: String,
}

/// A previously seen ticket that the model considers related to a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityCandidate {
    pub ticket_id: String,
    pub summary: String,
    pub similarity: f64,
}

/// Ticket ids the bot has commented on during this process lifetime.
///
/// Membership only grows.
#[derive(Debug, Default, Clone)]
pub struct ProcessedSet {
    ids: HashSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a ticket as processed; returns `false` if it already was.
    pub fn insert(&mut self, ticket_id: &str) -> bool {
        self.ids.insert(ticket_id.to_string())
    }

    pub fn contains(&self, ticket_id: &str) -> bool {
        self.ids.contains(ticket_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_type_from_str() {
        assert_eq!(IssueType::from("Bug"), IssueType::Bug);
        assert_eq!(IssueType::from("Support"), IssueType::Support);
        assert_eq!(IssueType::from("Story"), IssueType::Other("Story".to_string()));

        // Matching is exact, like the tracker's own names.
        assert_eq!(IssueType::from("bug"), IssueType::Other("bug".to_string()));
    }

    #[test]
    fn test_issue_type_eligibility() {
        assert!(IssueType::Bug.is_root_cause_eligible());
        assert!(IssueType::Support.is_root_cause_eligible());
        assert!(!IssueType::Other("Task".to_string()).is_root_cause_eligible());
    }

    #[test]
    fn test_ticket_serde_uses_plain_issue_type() {
        let ticket: Ticket = serde_json::from_value(serde_json::json!({
            "id": "ABC-1",
            "issue_type": "Story",
            "summary": "Add dark mode"
        }))
        .unwrap();

        assert_eq!(ticket.issue_type, IssueType::Other("Story".to_string()));
        assert!(ticket.description.is_empty());

        let value = serde_json::to_value(&ticket).unwrap();
        assert_eq!(value["issue_type"], "Story");
    }

    #[test]
    fn test_processed_set_adds_once() {
        let mut processed = ProcessedSet::new();
        assert!(processed.is_empty());

        assert!(processed.insert("ABC-1"));
        assert!(!processed.insert("ABC-1"));
        assert!(processed.insert("ABC-2"));

        assert!(processed.contains("ABC-1"));
        assert!(!processed.contains("ABC-3"));
        assert_eq!(processed.len(), 2);
    }
}
