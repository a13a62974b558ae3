pub mod ollama;
pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    config::{Config, LlmProvider},
    types::Res,
};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the single operation the triage pipeline needs from a
/// large language model. Implementing this trait allows different LLM
/// providers to be used with the triage bot.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Send a prompt and return the raw text reply.
    ///
    /// No streaming: the whole reply is returned at once. Any transport or
    /// provider failure is returned as an error.
    async fn invoke(&self, prompt: &str) -> Res<String>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }

    /// Create the client selected by `llm_provider`.
    pub fn from_config(config: &Config) -> Res<Self> {
        match config.llm_provider {
            LlmProvider::Ollama => LlmClient::ollama(config),
            LlmProvider::OpenAi => Ok(LlmClient::openai(config)),
        }
    }
}
