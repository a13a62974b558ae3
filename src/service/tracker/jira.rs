//! Jira REST (v2) implementation of the tracker client.
//!
//! Authenticates with basic auth (username + API token). Descriptions may be
//! plain strings or Atlassian Document Format (ADF) JSON; both become plain text.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::base::{
    config::Config,
    types::{IssueType, NewTicket, Res, Ticket, Void},
};

use super::{GenericTrackerClient, TrackerClient};

/// Fields requested for every ticket read.
const TICKET_FIELDS: &str = "summary,description,issuetype,created";

/// Attachment filename suffixes treated as logs.
const LOG_SUFFIXES: [&str; 2] = [".log", ".txt"];

// Extra methods on `TrackerClient` applied by the jira implementation.

impl TrackerClient {
    /// Creates a new Jira tracker client.
    pub fn jira(config: &Config) -> Res<Self> {
        let client = JiraTrackerClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

#[derive(Debug, Deserialize)]
pub struct JiraSearchResponse {
    #[serde(default)]
    pub issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
pub struct JiraIssue {
    /// Issue key (e.g., "ABC-123").
    pub key: String,
    pub fields: JiraIssueFields,
}

#[derive(Debug, Deserialize)]
pub struct JiraIssueFields {
    #[serde(default)]
    pub summary: String,
    /// Plain text, ADF, or null.
    pub description: Option<Value>,
    #[serde(rename = "issuetype")]
    pub issue_type: Option<JiraIssueType>,
    pub created: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JiraIssueType {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JiraAttachmentIssue {
    pub fields: JiraAttachmentFields,
}

#[derive(Debug, Deserialize)]
pub struct JiraAttachmentFields {
    #[serde(default)]
    pub attachment: Vec<JiraAttachment>,
}

#[derive(Debug, Deserialize)]
pub struct JiraAttachment {
    pub filename: String,
    /// Download URL.
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct JiraCommentPage {
    #[serde(default)]
    pub comments: Vec<JiraComment>,
}

#[derive(Debug, Deserialize)]
pub struct JiraComment {
    pub author: Option<JiraUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub email_address: Option<String>,
    /// Username (Jira Server / Data Center).
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JiraCreatedIssue {
    key: String,
}

// Mapping helpers.

impl From<JiraIssue> for Ticket {
    fn from(issue: JiraIssue) -> Self {
        let JiraIssue { key, fields } = issue;

        Ticket {
            id: key,
            issue_type: fields.issue_type.map(|t| IssueType::from(t.name)).unwrap_or_else(|| IssueType::Other("Unknown".to_string())),
            summary: fields.summary,
            description: fields.description.as_ref().map(extract_text_from_adf).unwrap_or_default(),
            created_at: fields.created.unwrap_or_default(),
        }
    }
}

/// Extract plain text from Atlassian Document Format (ADF).
///
/// Plain strings pass through unchanged; `null` becomes empty. Block nodes
/// (paragraphs, headings, ...) are separated by newlines.
pub fn extract_text_from_adf(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let mut text = String::new();

            if let Some(Value::String(t)) = obj.get("text") {
                text.push_str(t);
            }

            if let Some(Value::Array(content)) = obj.get("content") {
                let parts = content.iter().map(extract_text_from_adf).collect::<Vec<_>>();

                // Children of the document root are blocks.
                if obj.get("type").and_then(Value::as_str) == Some("doc") {
                    text.push_str(&parts.join("\n"));
                } else {
                    text.push_str(&parts.concat());
                }
            }

            text
        }
        Value::Array(arr) => arr.iter().map(extract_text_from_adf).collect(),
        _ => String::new(),
    }
}

/// Whether an attachment is read as logs.
pub fn is_log_attachment(filename: &str) -> bool {
    LOG_SUFFIXES.iter().any(|suffix| filename.ends_with(suffix))
}

/// Whether any comment on the page was written by `username`.
pub fn has_comment_by(page: &JiraCommentPage, username: &str) -> bool {
    page.comments.iter().filter_map(|c| c.author.as_ref()).any(|author| {
        author.email_address.as_deref() == Some(username) || author.name.as_deref() == Some(username)
    })
}

// Specific implementations.

/// Jira tracker client implementation.
#[derive(Clone)]
pub struct JiraTrackerClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    api_token: String,
    max_results: u32,
}

impl JiraTrackerClient {
    /// Create a new Jira tracker client.
    #[instrument(name = "JiraTrackerClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: config.jira_url.trim_end_matches('/').to_string(),
            username: config.jira_username.clone(),
            api_token: config.jira_api_token.clone(),
            max_results: config.jira_max_results,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/rest/api/2{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.api_token)).header("Accept", "application/json")
    }

    /// Send a request, fail on a non-success status, and decode the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Res<T> {
        let resp = self.authed(request).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Jira API error: {} - {}", status, body);
        }

        Ok(resp.json().await?)
    }

    async fn get_ticket(&self, ticket_id: &str) -> Res<Ticket> {
        let request = self.http.get(self.api_url(&format!("/issue/{ticket_id}"))).query(&[("fields", TICKET_FIELDS)]);
        let issue: JiraIssue = self.send_json(request).await?;

        Ok(issue.into())
    }

    async fn download_attachment(&self, attachment: &JiraAttachment) -> Res<String> {
        let resp = self.authed(self.http.get(&attachment.content)).send().await?.error_for_status()?;

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl GenericTrackerClient for JiraTrackerClient {
    #[instrument(name = "JiraTrackerClient::create_ticket", skip_all)]
    async fn create_ticket(&self, ticket: &NewTicket) -> Res<Ticket> {
        let body = json!({
            "fields": {
                "project": { "key": ticket.project_key },
                "summary": ticket.summary,
                "description": ticket.description,
                "issuetype": { "name": ticket.issue_type.to_string() },
            }
        });

        let created: JiraCreatedIssue = self.send_json(self.http.post(self.api_url("/issue")).json(&body)).await?;

        info!("Created ticket {}.", created.key);

        self.get_ticket(&created.key).await
    }

    #[instrument(name = "JiraTrackerClient::get_tickets", skip_all)]
    async fn get_tickets(&self, filter: &str) -> Res<Vec<Ticket>> {
        let max_results = self.max_results.to_string();
        let request = self
            .http
            .get(self.api_url("/search"))
            .query(&[("jql", filter), ("maxResults", max_results.as_str()), ("fields", TICKET_FIELDS)]);

        let page: JiraSearchResponse = self.send_json(request).await?;

        debug!("Jira search returned {} tickets.", page.issues.len());

        Ok(page.issues.into_iter().map(Ticket::from).collect())
    }

    #[instrument(name = "JiraTrackerClient::fetch_attachment_content", skip_all)]
    async fn fetch_attachment_content(&self, ticket_id: &str) -> Res<String> {
        let request = self.http.get(self.api_url(&format!("/issue/{ticket_id}"))).query(&[("fields", "attachment")]);
        let issue: JiraAttachmentIssue = self.send_json(request).await?;

        let mut contents = Vec::new();

        for attachment in issue.fields.attachment.iter().filter(|a| is_log_attachment(&a.filename)) {
            match self.download_attachment(attachment).await {
                Ok(text) => contents.push(text),
                Err(err) => warn!("Error fetching attachment {} for ticket {}: {}", attachment.filename, ticket_id, err),
            }
        }

        Ok(contents.join("\n").trim().to_string())
    }

    #[instrument(name = "JiraTrackerClient::has_bot_comment", skip_all)]
    async fn has_bot_comment(&self, ticket_id: &str) -> Res<bool> {
        let page: JiraCommentPage = self.send_json(self.http.get(self.api_url(&format!("/issue/{ticket_id}/comment")))).await?;

        Ok(has_comment_by(&page, &self.username))
    }

    #[instrument(name = "JiraTrackerClient::add_comment", skip_all)]
    async fn add_comment(&self, ticket_id: &str, text: &str) -> Void {
        let request = self.http.post(self.api_url(&format!("/issue/{ticket_id}/comment"))).json(&json!({ "body": text }));
        let _: Value = self.send_json(request).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::config::ConfigInner;

    #[test]
    fn test_ticket_from_search_issue() {
        let page: JiraSearchResponse = serde_json::from_value(json!({
            "startAt": 0,
            "total": 2,
            "issues": [
                {
                    "id": "10001",
                    "key": "ABC-1",
                    "fields": {
                        "summary": "Login fails",
                        "description": "Users get a 500 on submit.",
                        "issuetype": { "name": "Bug" },
                        "created": "2025-01-01T10:00:00.000+0000"
                    }
                },
                {
                    "id": "10002",
                    "key": "ABC-2",
                    "fields": {
                        "summary": "Add export",
                        "description": null,
                        "issuetype": { "name": "Story" }
                    }
                }
            ]
        }))
        .unwrap();

        let tickets = page.issues.into_iter().map(Ticket::from).collect::<Vec<_>>();

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, "ABC-1");
        assert_eq!(tickets[0].issue_type, IssueType::Bug);
        assert_eq!(tickets[0].description, "Users get a 500 on submit.");
        assert_eq!(tickets[0].created_at, "2025-01-01T10:00:00.000+0000");

        assert_eq!(tickets[1].issue_type, IssueType::Other("Story".to_string()));
        assert!(tickets[1].description.is_empty());
        assert!(tickets[1].created_at.is_empty());
    }

    #[test]
    fn test_extract_text_from_adf_paragraphs() {
        let adf = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {
                    "type": "paragraph",
                    "content": [
                        { "type": "text", "text": "Login " },
                        { "type": "text", "text": "fails" }
                    ]
                },
                {
                    "type": "paragraph",
                    "content": [{ "type": "text", "text": "since Monday" }]
                }
            ]
        });

        assert_eq!(extract_text_from_adf(&adf), "Login fails\nsince Monday");
    }

    #[test]
    fn test_extract_text_from_plain_string() {
        assert_eq!(extract_text_from_adf(&json!("plain text")), "plain text");
        assert_eq!(extract_text_from_adf(&Value::Null), "");
    }

    #[test]
    fn test_is_log_attachment() {
        assert!(is_log_attachment("server.log"));
        assert!(is_log_attachment("notes.txt"));
        assert!(!is_log_attachment("screenshot.png"));
        assert!(!is_log_attachment("server.log.gz"));
    }

    #[test]
    fn test_has_comment_by() {
        let page: JiraCommentPage = serde_json::from_value(json!({
            "comments": [
                { "author": { "emailAddress": "someone@example.com", "displayName": "Someone" }, "body": "Me too" },
                { "body": "Anonymous" },
                { "author": { "name": "triage-bot" }, "body": "Hello" }
            ]
        }))
        .unwrap();

        assert!(has_comment_by(&page, "triage-bot"));
        assert!(has_comment_by(&page, "someone@example.com"));
        assert!(!has_comment_by(&page, "bot@example.com"));
    }

    #[test]
    fn test_api_url() {
        let config = Config::from(ConfigInner {
            jira_url: "https://tracker.example/".to_string(),
            ..Default::default()
        });

        let client = JiraTrackerClient::new(&config).unwrap();

        assert_eq!(client.api_url("/search"), "https://tracker.example/rest/api/2/search");
    }
}
