mod harness;

use futures_util::StreamExt;
use harness::config::ConfigBuilder;
use harness::mock_upstream::{Behavior, MockUpstream};
use harness::server::TestServer;
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn start(behavior: Behavior) -> (MockUpstream, TestServer) {
    let upstream = MockUpstream::start(behavior).await.unwrap();
    let config = ConfigBuilder::new().with_upstream(&upstream).build();
    let server = TestServer::start(config).await.unwrap();

    (upstream, server)
}

fn content_type(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

#[tokio::test]
async fn openai_fragments_become_frames() {
    let (upstream, server) = start(Behavior::fragments(&["He", "llo"])).await;

    let resp = server
        .post_json("/ask_stream", &json!({"message": "hi", "api_provider": "openai"}))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("text/event-stream"));
    assert_eq!(resp.text().await.unwrap(), "data: He\n\ndata: llo\n\n");

    let request = upstream.single_request();
    assert_eq!(request.body["stream"], true);
}

#[tokio::test]
async fn only_model_and_temperature_are_forwarded() {
    let (upstream, server) = start(Behavior::fragments(&["ok"])).await;

    let resp = server
        .post_json(
            "/ask_stream",
            &json!({
                "message": "hi",
                "model": "gpt-4o",
                "temperature": 0.3,
                "max_tokens": 42,
                "top_p": 0.5
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text().await.unwrap();

    let body = upstream.single_request().body;
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["temperature"], 0.3);
    assert!(body.get("max_tokens").is_none());
    assert!(body.get("top_p").is_none());
}

#[tokio::test]
async fn gemini_fragments_become_frames() {
    let (upstream, server) = start(Behavior::fragments(&["Bon", "jour"])).await;

    let resp = server
        .post_json(
            "/ask_stream",
            &json!({"message": "hi", "api_provider": "gemini", "model": "gemini-1.5-flash"}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "data: Bon\n\ndata: jour\n\n");

    let request = upstream.single_request();
    assert_eq!(request.path, "/gemini/models/gemini-1.5-flash:streamGenerateContent");
    assert_eq!(request.query.get("alt").map(String::as_str), Some("sse"));
    assert!(request.body.get("systemInstruction").is_none());
}

#[tokio::test]
async fn openai_stream_error_ends_with_error_frame() {
    let (_upstream, server) = start(Behavior::FragmentsThenError(vec!["a".to_owned(), "b".to_owned()])).await;

    let resp = server.post_json("/ask_stream", &json!({"message": "hi"})).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.text().await.unwrap(),
        "data: a\n\ndata: b\n\ndata: [ERROR: streaming error: upstream overloaded]\n\n"
    );
}

#[tokio::test]
async fn gemini_stream_error_ends_with_error_frame() {
    let (_upstream, server) = start(Behavior::FragmentsThenError(vec!["a".to_owned()])).await;

    let resp = server
        .post_json("/ask_stream", &json!({"message": "hi", "api_provider": "gemini"}))
        .await;

    let text = resp.text().await.unwrap();
    let frames: Vec<&str> = text.split_terminator("\n\n").collect();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], "data: a");
    assert!(frames[1].starts_with("data: [ERROR: streaming error: malformed chunk"));
}

#[tokio::test]
async fn upstream_rejection_is_a_single_error_frame() {
    let (_upstream, server) = start(Behavior::Fail(StatusCode::UNAUTHORIZED)).await;

    let resp = server.post_json("/ask_stream", &json!({"message": "hi"})).await;

    assert_eq!(resp.status(), StatusCode::OK);

    let text = resp.text().await.unwrap();
    assert!(text.starts_with("data: [ERROR: upstream error: provider returned 401 Unauthorized"));
    assert!(text.ends_with("]\n\n"));
    assert_eq!(text.matches("\n\n").count(), 1);
}

#[tokio::test]
async fn unknown_provider_closes_without_frames() {
    let (upstream, server) = start(Behavior::fragments(&["unused"])).await;

    let resp = server
        .post_json("/ask_stream", &json!({"message": "hi", "api_provider": "anthropic"}))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("text/event-stream"));
    assert_eq!(resp.text().await.unwrap(), "");
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn perplexity_closes_without_frames() {
    let (upstream, server) = start(Behavior::fragments(&["unused"])).await;

    let resp = server
        .post_json("/ask_stream", &json!({"message": "hi", "api_provider": "perplexity"}))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "");
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn missing_message_is_rejected_before_streaming() {
    let (upstream, server) = start(Behavior::fragments(&["unused"])).await;

    let resp = server.post_json("/ask_stream", &json!({"api_provider": "openai"})).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(content_type(&resp).starts_with("application/json"));
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"error": "user message not provided"})
    );
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn many_fragments_arrive_in_order() {
    let fragments: Vec<String> = (0..20).map(|i| format!("part{i}")).collect();
    let (_upstream, server) = start(Behavior::Fragments(fragments.clone())).await;

    let resp = server.post_json("/ask_stream", &json!({"message": "hi"})).await;

    let mut body = resp.bytes_stream();
    let mut text = String::new();
    while let Some(chunk) = body.next().await {
        text.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
    }

    let received: Vec<&str> = text
        .split_terminator("\n\n")
        .map(|frame| frame.trim_start_matches("data: "))
        .collect();
    assert_eq!(received, fragments);
}
