//! Integration with a local Ollama server.
//!
//! Uses the non-streaming `/api/generate` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::base::{config::Config, types::Res};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the ollama implementation.

impl LlmClient {
    pub fn ollama(config: &Config) -> Res<Self> {
        let client = OllamaLlmClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

// Specific implementations.

/// Ollama LLM client implementation.
#[derive(Clone)]
pub struct OllamaLlmClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaLlmClient {
    /// Create a new Ollama LLM client.
    #[instrument(name = "OllamaLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/generate", config.ollama_url.trim_end_matches('/')),
            model: config.ollama_model.clone(),
            temperature: config.llm_temperature,
        })
    }
}

#[async_trait]
impl GenericLlmClient for OllamaLlmClient {
    #[instrument(name = "OllamaLlmClient::invoke", skip_all)]
    async fn invoke(&self, prompt: &str) -> Res<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: self.temperature },
        };

        let resp = self.http.post(&self.endpoint).json(&request).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error: {} - {}", status, body);
        }

        let GenerateResponse { response } = resp.json().await?;

        debug!("Ollama reply has {} characters.", response.len());

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::config::ConfigInner;

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            model: "gemma3:1b",
            prompt: "Hello",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gemma3:1b");
        assert_eq!(value["prompt"], "Hello");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["temperature"], 0.5);
    }

    #[test]
    fn test_generate_response_ignores_extra_fields() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "model": "gemma3:1b",
            "created_at": "2025-01-01T00:00:00Z",
            "response": "- [ABC-1]: Login fails (Similarity: 0.85)",
            "done": true
        }))
        .unwrap();

        assert_eq!(response.response, "- [ABC-1]: Login fails (Similarity: 0.85)");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = Config::from(ConfigInner {
            ollama_url: "http://localhost:11434/".to_string(),
            ..Default::default()
        });

        let client = OllamaLlmClient::new(&config).unwrap();

        assert_eq!(client.endpoint, "http://localhost:11434/api/generate");
        assert_eq!(client.model, "gemma3:1b");
    }
}
