//! Wire format types for the upstream provider APIs
//!
//! Pure serde structs matching each provider's JSON. Only the fields the
//! relay reads or writes are modeled; unknown fields are ignored on input.

pub mod gemini;
pub mod openai;
