//! Chart Routes
//!
//! - GET / - Page embedding the live chart
//! - GET /chart.svg - Current scene as SVG

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use std::sync::Arc;
use std::time::Instant;

use crate::api::state::AppState;

/// GET /chart.svg
///
/// In-flight transitions are emitted as SMIL animations covering their
/// remaining time.
pub async fn chart_svg(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let svg = state.view.read().await.render_svg(Instant::now());

    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        svg,
    )
}

/// GET /
///
/// Reloads `/chart.svg` once per poll interval.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let interval_ms = state.config.poller.interval().as_millis();
    let svg = state.view.read().await.render_svg(Instant::now());
    Html(render_index(&svg, interval_ms))
}

fn render_index(initial_svg: &str, interval_ms: u128) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>vowelscope</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
#chart {{ overflow-x: auto; }}
</style>
</head>
<body>
<div id="chart">{svg}</div>
<script>
const chart = document.getElementById("chart");
async function reload() {{
  try {{
    const response = await fetch("/chart.svg", {{ cache: "no-store" }});
    if (response.ok) chart.innerHTML = await response.text();
  }} catch (e) {{}}
}}
setInterval(reload, {interval});
</script>
</body>
</html>
"#,
        svg = initial_svg,
        interval = interval_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_embeds_chart_and_interval() {
        let page = render_index("<svg></svg>", 5000);
        assert!(page.contains(r#"<div id="chart"><svg></svg></div>"#));
        assert!(page.contains("setInterval(reload, 5000);"));
    }
}
