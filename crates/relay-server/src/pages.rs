//! Static routes: the chat page and the liveness probe

use axum::response::Html;

/// Chat page served at `/`, posting to `/ask_stream`
const INDEX_HTML: &str = include_str!("../static/index.html");

pub async fn landing_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Liveness probe, always `200 ok`
pub async fn health_handler() -> &'static str {
    "ok"
}
