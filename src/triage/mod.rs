//! The triage pipeline.
//!
//! For each new ticket:
//! - `similarity` asks the model which known tickets resemble it,
//! - `analyzer` asks the model for a triage or a root cause,
//! - `formatter` renders everything into one comment,
//! - `bot` fetches tickets, drives the steps above, and posts the comment.

pub mod analyzer;
pub mod bot;
pub mod formatter;
pub mod similarity;
