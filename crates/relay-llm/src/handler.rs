//! Axum route handlers for the buffered and streaming relay endpoints

use std::convert::Infallible;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::{Stream, StreamExt, future, stream};

use crate::error::{HttpError, LlmError};
use crate::state::LlmState;
use crate::types::{AskRequest, AskResponse, ErrorResponse, FragmentStream, ProviderKind, StreamRequest, validate_message};

/// Build the relay router with both endpoints
pub fn llm_router(state: LlmState) -> Router {
    Router::new()
        .route("/ask", routing::post(ask))
        .route("/ask_stream", routing::post(ask_stream))
        .with_state(state)
}

// -- Buffered mode --

/// Handle `POST /ask`
async fn ask(State(state): State<LlmState>, payload: Result<Json<AskRequest>, JsonRejection>) -> Response {
    match relay_ask(&state, payload).await {
        Ok(text) => Json(AskResponse { response: text }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn relay_ask(state: &LlmState, payload: Result<Json<AskRequest>, JsonRejection>) -> Result<String, LlmError> {
    let Json(request) = payload.map_err(rejection_error)?;

    let message = validate_message(request.message.as_ref())?;
    let kind: ProviderKind = request.provider_tag().parse()?;
    let provider = state.provider(kind)?;
    let params = request.params(provider.default_model());

    tracing::info!(
        provider = %kind,
        model = %params.model,
        temperature = params.temperature,
        max_tokens = ?params.max_tokens,
        top_p = ?params.top_p,
        frequency_penalty = ?params.frequency_penalty,
        presence_penalty = ?params.presence_penalty,
        "message received"
    );
    tracing::debug!(user_message = message, "user message");

    let text = provider.complete(message, &params).await.inspect_err(|e| {
        tracing::error!(provider = %kind, model = %params.model, error = %e, "failed to generate response");
    })?;

    tracing::debug!(response = %text, "response generated");

    Ok(text)
}

// -- Streaming mode --

/// Handle `POST /ask_stream`
async fn ask_stream(State(state): State<LlmState>, payload: Result<Json<StreamRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(&rejection_error(rejection)),
    };

    let message = match validate_message(request.message.as_ref()) {
        Ok(message) => message,
        Err(e) => return error_response(&e),
    };

    let fragments = open_fragments(&state, &request, message).await;

    Sse::new(fragment_events(fragments)).into_response()
}

/// Open the upstream fragment stream for a streaming request
///
/// The provider tag is not validated here: an unknown tag, or a provider
/// without a streaming variant, produces a stream with no fragments. A
/// failure to open the upstream becomes a single error item.
async fn open_fragments(state: &LlmState, request: &StreamRequest, message: &str) -> FragmentStream {
    let tag = request.provider_tag();

    let provider = match tag.parse::<ProviderKind>().and_then(|kind| state.provider(kind)) {
        Ok(provider) if provider.capabilities().streaming => provider,
        _ => {
            tracing::warn!(provider = %tag, "provider cannot stream, closing stream without fragments");
            return Box::pin(stream::empty());
        }
    };

    let params = request.params(provider.default_model());

    tracing::info!(provider = %tag, model = %params.model, temperature = params.temperature, "streaming message");
    tracing::debug!(user_message = message, "user message");

    match provider.complete_stream(message, &params).await {
        Ok(fragments) => fragments,
        Err(e) => Box::pin(stream::once(future::ready(Err(e)))),
    }
}

/// Frame each fragment as one SSE `data` event
///
/// The first error becomes a final `[ERROR: ...]` frame and ends the
/// stream; nothing after it is read from upstream.
fn fragment_events(fragments: FragmentStream) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some(fragments), |fragments| async move {
        let mut fragments = fragments?;

        match fragments.next().await? {
            Ok(text) => Some((Ok(data_event(&text)), Some(fragments))),
            Err(e) => {
                tracing::error!(error = %e, "streaming failed");
                Some((Ok(data_event(&format!("[ERROR: {e}]"))), None))
            }
        }
    })
}

/// SSE `data` event for a fragment
///
/// SSE treats a bare carriage return as a line break, so it is normalized
/// to `\n` before the text is split into `data:` lines.
fn data_event(text: &str) -> Event {
    if text.contains('\r') {
        Event::default().data(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Event::default().data(text)
    }
}

// -- Errors --

fn rejection_error(rejection: JsonRejection) -> LlmError {
    LlmError::InvalidRequest(rejection.body_text())
}

/// Convert an error to a `{ "error": ... }` JSON response
fn error_response(error: &LlmError) -> Response {
    if error.is_client_error() {
        tracing::warn!(error = %error, "rejected request");
    }

    let body = ErrorResponse {
        error: error.client_message(),
    };

    (error.status_code(), Json(body)).into_response()
}
