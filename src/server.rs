//! Browser UI and JSON API.
//!
//! Serves a single-page interview prep form plus a small JSON surface for
//! scripted clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | HTML page; `?q=<question>` asks and renders the answer |
//! | `POST` | `/api/ask` | `{ "question", "top_k"? }` → answer plus sources |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! JSON errors use one shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `upstream_error` (502).
//!
//! The HTML page never substitutes an answer when the pipeline fails; it
//! renders an error panel with status 502 instead.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::answer::Assistant;
use crate::config::{Config, Credentials};
use crate::models::{Answer, RetrievalMatch};
use crate::retrieve::preview;
use crate::services::Services;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
    example_questions: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(assistant: Assistant, example_questions: Vec<String>) -> Self {
        Self {
            assistant: Arc::new(assistant),
            example_questions: Arc::new(example_questions),
        }
    }
}

/// Build the router. Split from [`run_server`] so tests can bind it to an
/// ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_page))
        .route("/api/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// `prep serve`: connect the services and serve until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let credentials = Credentials::from_env()?;
    let services = Services::connect(config, &credentials).await?;
    let assistant = Assistant::from_services(&services, config);
    let state = AppState::new(assistant, config.server.example_questions.clone());

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("Interview prep UI listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, "server started");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn upstream_error(err: &anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_error",
        message: format!("{:#}", err),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<SourceView>,
}

#[derive(Serialize)]
struct SourceView {
    source: String,
    score: f32,
    preview: String,
}

impl From<&RetrievalMatch> for SourceView {
    fn from(m: &RetrievalMatch) -> Self {
        Self {
            source: m.source.clone(),
            score: m.score,
            preview: preview(&m.text),
        }
    }
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let top_k = req.top_k.unwrap_or(state.assistant.top_k());
    let answer = state
        .assistant
        .ask_with_top_k(question, top_k)
        .await
        .map_err(|e| {
            tracing::error!(error = %format!("{:#}", e), "ask failed");
            upstream_error(&e)
        })?;

    Ok(Json(AskResponse {
        sources: answer.contexts.iter().map(SourceView::from).collect(),
        answer: answer.text,
    }))
}

// ============ GET / ============

#[derive(Deserialize)]
struct PageQuery {
    q: Option<String>,
}

/// What the page body shows below the input.
enum Panel {
    Empty,
    Warning(&'static str),
    Answer(Answer),
    Error(String),
}

async fn handle_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> (StatusCode, Html<String>) {
    let (status, panel) = match query_panel(&state, query.q.as_deref()).await {
        Ok(panel) => (StatusCode::OK, panel),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "page ask failed");
            (StatusCode::BAD_GATEWAY, Panel::Error(format!("{:#}", e)))
        }
    };
    let raw = query.q.unwrap_or_default();
    (status, Html(render_page(&state.example_questions, &raw, &panel)))
}

async fn query_panel(state: &AppState, raw: Option<&str>) -> anyhow::Result<Panel> {
    let Some(raw) = raw else {
        return Ok(Panel::Empty);
    };
    let question = raw.trim();
    if question.is_empty() {
        return Ok(Panel::Warning("Please enter a question!"));
    }
    Ok(Panel::Answer(state.assistant.ask(question).await?))
}

const STYLE: &str = "body{font-family:sans-serif;margin:0;display:flex}\
aside{width:260px;padding:1rem;background:#f4f5f7;min-height:100vh}\
aside a{display:block;margin:.4rem 0;color:#1f4e9c;text-decoration:none}\
main{flex:1;padding:1.5rem 2rem;max-width:900px}\
input[type=text]{width:75%;padding:.5rem}\
.warning{background:#fff6d6;padding:.8rem;border-radius:4px}\
.success{color:#1a7f37}\
.error{background:#fde2e1;padding:.8rem;border-radius:4px}\
.answer{white-space:pre-wrap;line-height:1.5}\
.source{margin:.8rem 0}";

fn render_page(examples: &[String], question: &str, panel: &Panel) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Interview Prep RAG</title>\n");
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n");

    html.push_str("<aside>\n<h3>Example Questions</h3>\n");
    for example in examples {
        let _ = writeln!(
            html,
            "<a href=\"/?q={}\">{}</a>",
            encode_query(example),
            escape_html(example)
        );
    }
    html.push_str("</aside>\n<main>\n");

    html.push_str("<h1>💼 Interview Prep Assistant</h1>\n");
    html.push_str(
        "<p>Ask questions about your experience, projects, and skills to prepare for interviews.</p>\n",
    );
    let placeholder = examples
        .first()
        .map(String::as_str)
        .unwrap_or("Tell me about your experience");
    let _ = writeln!(
        html,
        "<form method=\"get\" action=\"/\">\n\
         <input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"e.g., {}\">\n\
         <button type=\"submit\">Get Answer</button>\n</form>",
        escape_html(question),
        escape_html(placeholder)
    );

    match panel {
        Panel::Empty => {}
        Panel::Warning(message) => {
            let _ = writeln!(html, "<p class=\"warning\">{}</p>", escape_html(message));
        }
        Panel::Error(message) => {
            let _ = writeln!(
                html,
                "<div class=\"error\"><strong>Error:</strong> {}</div>",
                escape_html(message)
            );
        }
        Panel::Answer(answer) => render_answer(&mut html, answer),
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_answer(html: &mut String, answer: &Answer) {
    html.push_str("<h3 class=\"success\">Answer:</h3>\n");
    let _ = writeln!(html, "<div class=\"answer\">{}</div>", escape_html(&answer.text));

    html.push_str("<details>\n<summary>View Source Documents</summary>\n");
    for (i, ctx) in answer.contexts.iter().enumerate() {
        let _ = writeln!(
            html,
            "<div class=\"source\"><strong>Source {}: {} (Relevance: {:.3})</strong>\n<p>{}</p></div>",
            i + 1,
            escape_html(&ctx.source),
            ctx.score,
            escape_html(&preview(&ctx.text))
        );
    }
    html.push_str("</details>\n");
}

fn encode_query(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
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
