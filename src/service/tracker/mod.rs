pub mod jira;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{NewTicket, Res, Ticket, Void};

// Traits.

/// Generic ticket tracker trait that clients must implement.
///
/// This trait defines everything the triage bot needs from an issue tracker:
/// querying tickets, reading their attachments, and commenting on them.
/// Implementing this trait allows different trackers to be used with the triage bot.
#[async_trait]
pub trait GenericTrackerClient: Send + Sync + 'static {
    /// Create a new ticket and return it as the tracker stored it.
    async fn create_ticket(&self, ticket: &NewTicket) -> Res<Ticket>;

    /// Get all tickets matching the tracker-specific filter query.
    ///
    /// The filter is passed through unmodified.
    async fn get_tickets(&self, filter: &str) -> Res<Vec<Ticket>>;

    /// Get the text of the ticket's log attachments.
    ///
    /// Only attachments whose filename ends in `.log` or `.txt` are read. Their
    /// contents are joined with newlines and trimmed; an attachment that cannot
    /// be downloaded is skipped.
    async fn fetch_attachment_content(&self, ticket_id: &str) -> Res<String>;

    /// Whether the bot has already commented on the ticket.
    async fn has_bot_comment(&self, ticket_id: &str) -> Res<bool>;

    /// Add a plain-text comment to the ticket.
    async fn add_comment(&self, ticket_id: &str, text: &str) -> Void;
}

// Structs.

/// Tracker client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TrackerClient {
    inner: Arc<dyn GenericTrackerClient>,
}

impl Deref for TrackerClient {
    type Target = dyn GenericTrackerClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl TrackerClient {
    pub fn new(inner: Arc<dyn GenericTrackerClient>) -> Self {
        Self { inner }
    }
}
