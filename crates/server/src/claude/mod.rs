//! Claude API integration for design generation.
//!
//! The generator sends a single non-streaming request per design: a system
//! prompt describing the canvas, brand and inspiration, and one user turn
//! with the client's description. The reply text is handed to
//! [`crate::render::extract`] for parsing.

mod client;
mod error;
mod types;

pub use client::ClaudeClient;
pub use error::{ApiError, ApiErrorResponse, ClaudeError};
pub use types::{ChatRequest, ChatResponse, ContentBlock, Message, StopReason, Usage};
