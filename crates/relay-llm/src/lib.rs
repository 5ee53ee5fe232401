//! Provider relay for the web chat backend
//!
//! Forwards a single user message to an OpenAI-compatible, Gemini or
//! Perplexity upstream and normalizes the reply into plain text, either as
//! one buffered response (`POST /ask`) or as a server-sent event stream of
//! text fragments (`POST /ask_stream`).

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
mod handler;
pub mod protocol;
pub mod provider;
mod state;
pub mod types;

pub use error::{HttpError, LlmError};
pub use handler::llm_router;
pub use provider::{Provider, ProviderCapabilities, ProviderSet};
pub use state::LlmState;
pub use types::{CompletionParams, FragmentStream, ProviderKind};
