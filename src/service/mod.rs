//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the triage bot:
//! - Ticket trackers (e.g., Jira)
//! - LLM services (e.g., Ollama, OpenAI)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod llm;
pub mod tracker;
