//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::{Res, Void};

/// Default JQL filter for the ticket query.
fn default_jql_filter() -> String {
    r#"project = YOUR_PROJECT AND issuetype in (Bug, Support) AND status = "To Do""#.to_string()
}

/// Default page size for the ticket query.
fn default_jira_max_results() -> u32 {
    100
}

/// Default number of seconds between polls.
fn default_poll_interval_secs() -> u64 {
    60
}

/// Default LLM sampling temperature.
fn default_llm_temperature() -> f32 {
    0.7
}

/// Default Ollama endpoint.
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Default Ollama model.
fn default_ollama_model() -> String {
    "gemma3:1b".to_string()
}

/// Default OpenAI model.
fn default_openai_model() -> String {
    "gpt-4.1".to_string()
}

/// Default max output tokens for OpenAI model.
fn default_openai_max_tokens() -> u32 {
    4096
}

/// Default root cause prompt.
fn default_root_cause_prompt() -> String {
    prompts::ROOT_CAUSE_PROMPT.to_string()
}

/// Default initial triage prompt.
fn default_initial_triage_prompt() -> String {
    prompts::INITIAL_TRIAGE_PROMPT.to_string()
}

/// Default similarity check prompt.
fn default_similarity_prompt() -> String {
    prompts::SIMILARITY_PROMPT.to_string()
}

/// Which language model backend answers the prompts.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// A local Ollama server.
    #[default]
    Ollama,
    /// The OpenAI API.
    OpenAi,
}

/// Configuration for the triage bot application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Jira base URL, also used for ticket links (`JIRA_URL`).
    pub jira_url: String,
    /// Jira username; the bot's comments are recognized by it (`JIRA_USERNAME`).
    pub jira_username: String,
    /// Jira API token (`JIRA_API_TOKEN`).
    pub jira_api_token: String,
    /// JQL filter selecting the tickets to triage (`JQL_FILTER`).
    #[serde(default = "default_jql_filter")]
    pub jql_filter: String,
    /// Max tickets fetched per poll (`JIRA_MAX_RESULTS`).
    #[serde(default = "default_jira_max_results")]
    pub jira_max_results: u32,
    /// Seconds to wait between polls (`POLL_INTERVAL_SECS`).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// LLM backend, `ollama` or `openai` (`LLM_PROVIDER`).
    #[serde(default)]
    pub llm_provider: LlmProvider,
    /// Sampling temperature for either backend (`LLM_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,
    /// Ollama endpoint (`OLLAMA_URL`).
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    /// Ollama model (`OLLAMA_MODEL`).
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    /// OpenAI API key, required for the `openai` provider (`OPENAI_API_KEY`).
    #[serde(default)]
    pub openai_api_key: String,
    /// OpenAI model (`OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Max output tokens for OpenAI model (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Optional override of the root cause prompt (`ROOT_CAUSE_PROMPT`).
    #[serde(default = "default_root_cause_prompt")]
    pub root_cause_prompt: String,
    /// Optional override of the initial triage prompt (`INITIAL_TRIAGE_PROMPT`).
    #[serde(default = "default_initial_triage_prompt")]
    pub initial_triage_prompt: String,
    /// Optional override of the similarity check prompt (`SIMILARITY_PROMPT`).
    #[serde(default = "default_similarity_prompt")]
    pub similarity_prompt: String,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            jira_url: String::new(),
            jira_username: String::new(),
            jira_api_token: String::new(),
            jql_filter: default_jql_filter(),
            jira_max_results: default_jira_max_results(),
            poll_interval_secs: default_poll_interval_secs(),
            llm_provider: LlmProvider::default(),
            llm_temperature: default_llm_temperature(),
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            openai_api_key: String::new(),
            openai_model: default_openai_model(),
            openai_max_tokens: default_openai_max_tokens(),
            root_cause_prompt: default_root_cause_prompt(),
            initial_triage_prompt: default_initial_triage_prompt(),
            similarity_prompt: default_similarity_prompt(),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("TRIAGE_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check value ranges and provider requirements.
    pub fn validate(&self) -> Void {
        if self.jira_url.trim().is_empty() {
            return Err(anyhow::anyhow!("Jira URL must not be empty."));
        }

        if self.llm_temperature < 0.0 || self.llm_temperature > 2.0 {
            return Err(anyhow::anyhow!("LLM temperature must be between 0 and 2."));
        }

        if self.poll_interval_secs < 1 {
            return Err(anyhow::anyhow!("Poll interval must be at least 1 second."));
        }

        if self.jira_max_results < 1 || self.jira_max_results > 1000 {
            return Err(anyhow::anyhow!("Jira max results must be between 1 and 1000."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if self.llm_provider == LlmProvider::OpenAi && self.openai_api_key.is_empty() {
            return Err(anyhow::anyhow!("OpenAI API key is required when the LLM provider is `openai`."));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_inner() -> ConfigInner {
        ConfigInner {
            jira_url: "https://tracker.example".to_string(),
            jira_username: "bot@example.com".to_string(),
            jira_api_token: "token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::from(valid_inner());

        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.llm_provider, LlmProvider::Ollama);
        assert_eq!(config.ollama_model, "gemma3:1b");
        assert_eq!(config.similarity_prompt, prompts::SIMILARITY_PROMPT);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let config = Config::from(ConfigInner { llm_temperature: 2.5, ..valid_inner() });
        assert!(config.validate().is_err());

        let config = Config::from(ConfigInner { poll_interval_secs: 0, ..valid_inner() });
        assert!(config.validate().is_err());

        let config = Config::from(ConfigInner { jira_max_results: 0, ..valid_inner() });
        assert!(config.validate().is_err());

        let config = Config::from(ConfigInner { jira_url: " ".to_string(), ..valid_inner() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = Config::from(ConfigInner {
            llm_provider: LlmProvider::OpenAi,
            ..valid_inner()
        });
        assert!(config.validate().is_err());

        let config = Config::from(ConfigInner {
            llm_provider: LlmProvider::OpenAi,
            openai_api_key: "sk-test".to_string(),
            ..valid_inner()
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ticket-triage-bot-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
jira_url = "https://tracker.example"
jira_username = "bot@example.com"
jira_api_token = "token"
poll_interval_secs = 15
llm_provider = "openai"
openai_api_key = "sk-test"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path));
        std::fs::remove_file(&path).unwrap();
        let config = config.unwrap();

        assert_eq!(config.jira_url, "https://tracker.example");
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.llm_provider, LlmProvider::OpenAi);
        assert_eq!(config.jira_max_results, 100);
    }
}
