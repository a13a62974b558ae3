//! Integration with the OpenAI API.
//!
//! A thin wrapper around `async-openai` that sends one chat completion per
//! prompt and returns the text of the first choice.

use std::sync::Arc;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::base::{config::Config, types::Res};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::invoke", skip_all)]
    async fn invoke(&self, prompt: &str) -> Res<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestUserMessageArgs::default().content(prompt).build()?.into()];

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.config.openai_model).max_completion_tokens(self.config.openai_max_tokens).messages(messages);

        // Reasoning (`o`) models reject a temperature.
        if self.config.openai_model.starts_with("gpt") {
            request.temperature(self.config.llm_temperature);
        }

        let response = self.client.chat().create(request.build()?).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no message content."))?;

        debug!("OpenAI reply has {} characters.", content.len());

        Ok(content)
    }
}

// Tests.
