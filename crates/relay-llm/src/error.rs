use http::StatusCode;
use thiserror::Error;

/// Message returned to clients for every failure that is not their fault
pub const GENERIC_CLIENT_MESSAGE: &str = "error processing your request";

/// Errors that can occur while relaying a chat message
#[derive(Debug, Error)]
pub enum LlmError {
    /// `message` was absent, null or empty
    #[error("user message not provided")]
    MissingMessage,

    /// `message` was present but not a JSON string
    #[error("message must be a string")]
    InvalidMessageType,

    /// `api_provider` is not one of the known provider tags
    #[error("invalid API provider: {provider}")]
    InvalidProvider { provider: String },

    /// Request body could not be decoded
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider exists but has no adapter, or lacks the requested mode
    #[error("unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// Upstream provider failed or returned an unusable reply
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Upstream stream broke or sent an unusable chunk
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Whether the client caused this error
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingMessage | Self::InvalidMessageType | Self::InvalidProvider { .. } | Self::InvalidRequest(_)
        )
    }
}

/// Domain errors that can be turned into HTTP responses
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn client_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            GENERIC_CLIENT_MESSAGE.to_owned()
        }
    }
}
