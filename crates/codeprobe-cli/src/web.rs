//! Single-page web front end.
//!
//! `GET /` serves the upload form, `POST /classify` takes a multipart upload
//! (field `file`) and renders the verdict under the uploaded code, and
//! `GET /health` reports liveness as JSON.

use std::f32::consts::PI;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use codeprobe_ai::Pipeline;
use codeprobe_core::report::Breakdown;
use codeprobe_core::{Language, Report, SourceSubmission};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const TITLE: &str = "AI vs Human Code Classification";
const RING_RADIUS: f32 = 70.0;

#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
    started: Instant,
}

/// Build the router around an already-loaded pipeline.
pub fn router(pipeline: Pipeline, max_upload_bytes: usize) -> Router {
    let state = AppState {
        pipeline,
        started: Instant::now(),
    };

    Router::new()
        .route("/", get(index))
        .route("/classify", post(classify))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(
    pipeline: Pipeline,
    addr: SocketAddr,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let model = pipeline.models().model_name().to_string();
    let app = router(pipeline, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, model = %model, max_upload_bytes, "serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

// ── Handlers ──

async fn index() -> Html<String> {
    Html(render_page(""))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let models = state.pipeline.models();
    Json(json!({
        "status": "healthy",
        "service": "codeprobe",
        "model": models.model_name(),
        "embedding_dim": models.dim(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.started.elapsed().as_secs(),
    }))
}

async fn classify(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err((status, message)) => {
            warn!(%status, reason = %message, "upload refused");
            let body = render_notice("Error", &message);
            return (status, Html(render_page(&body))).into_response();
        }
    };

    let language = match upload
        .file_name
        .as_deref()
        .map(Path::new)
        .and_then(Language::from_path)
    {
        Some(language) => language,
        None => {
            warn!(
                file = upload.file_name.as_deref().unwrap_or("-"),
                "upload has no recognised extension"
            );
            Language::default()
        }
    };

    let mut submission = match SourceSubmission::from_utf8(upload.bytes, language) {
        Ok(submission) => submission,
        Err(_) => {
            let body = render_notice("Error", "The uploaded file is not valid UTF-8 text.");
            return (StatusCode::BAD_REQUEST, Html(render_page(&body))).into_response();
        }
    };
    if let Some(name) = upload.file_name {
        submission = submission.with_file_name(name);
    }

    let pipeline = state.pipeline.clone();
    let task_submission = submission.clone();
    let report = tokio::task::spawn_blocking(move || pipeline.report(&task_submission))
        .await
        .unwrap_or_else(Report::failed);

    let status = match report {
        Report::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };
    (status, Html(render_page(&render_report(&submission, &report)))).into_response()
}

struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (e.status(), e.body_text()))?;
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err((StatusCode::BAD_REQUEST, "No file was uploaded.".to_string()))
}

// ── Rendering ──

fn render_page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{TITLE}</title>
<style>
body {{ font-family: sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; color: #262730; }}
pre {{ background: #f0f2f6; padding: 1rem; border-radius: 6px; overflow-x: auto; }}
.warning {{ padding: 15px; background-color: #f44336; border-radius: 5px; border: 1px solid #ff5555; color: white; font-size: 18px; text-align: center; }}
.ring {{ display: block; margin: 1rem auto; }}
.track {{ height: 10px; background: #e6e6e6; border-radius: 5px; }}
.fill {{ height: 10px; border-radius: 5px; }}
h4 {{ text-align: center; }}
</style>
</head>
<body>
<h1>{TITLE}</h1>
<form action="/classify" method="post" enctype="multipart/form-data">
<label>Upload a Java file <input type="file" name="file" accept=".java"></label>
<button type="submit">Classify</button>
</form>
{body}
</body>
</html>
"#
    )
}

fn render_notice(title: &str, message: &str) -> String {
    format!(
        "<div class=\"warning\"><strong>{}:</strong> {}</div>",
        escape_html(title),
        escape_html(message)
    )
}

fn render_report(submission: &SourceSubmission, report: &Report) -> String {
    match report {
        Report::Rejected { message } => render_notice("Warning", message),
        Report::Failed { message } => render_notice("Error", message),
        Report::Classified(b) => format!(
            r#"<h3>Uploaded {language} Code:</h3>
<pre><code>{code}</code></pre>
<h4 style="color:{headline_color};">{headline}</h4>
{ring}<h3>Probability Breakdown</h3>
<p><strong>{human:.2}%</strong> Probability Human-generated | <strong>{ai:.2}%</strong> Probability AI-generated</p>
<div class="track"><div class="fill" style="width:{winning:.2}%; background:{color};"></div></div>
"#,
            language = submission.language(),
            code = escape_html(submission.content()),
            headline_color = b.headline_color,
            headline = escape_html(&b.headline),
            ring = render_ring(b),
            human = b.human_percentage,
            ai = b.ai_percentage,
            winning = b.winning_percentage,
            color = b.color,
        ),
    }
}

/// Donut chart whose coloured arc covers the winning percentage.
fn render_ring(b: &Breakdown) -> String {
    let circumference = 2.0 * PI * RING_RADIUS;
    let arc = circumference * b.winning_fraction();
    format!(
        r##"<svg class="ring" width="200" height="200" viewBox="0 0 200 200">
<circle cx="100" cy="100" r="{r}" fill="none" stroke="#e6e6e6" stroke-width="24"/>
<circle cx="100" cy="100" r="{r}" fill="none" stroke="{color}" stroke-width="24" stroke-dasharray="{arc:.2} {circumference:.2}" transform="rotate(-90 100 100)"/>
<text x="100" y="100" text-anchor="middle" dominant-baseline="central" font-size="20">{label}</text>
</svg>
"##,
        r = RING_RADIUS,
        color = b.color,
        label = b.label_title(),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
