//! HTTP server for the browser chat client.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Front-end entry page (`<static_dir>/index.html`) |
//! | `GET`  | `/static/*` | Remaining static assets |
//! | `POST` | `/chat` | `{"message": ".."}` → `{"response": ".."}` |
//! | `POST` | `/reset` | Clear the conversation |
//! | `GET`  | `/documents` | Live listing of files under the document root |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Failures carry a flat body:
//!
//! ```json
//! { "error": "No message provided" }
//! ```
//!
//! `400` for a missing or empty message, `500` with the raw model error text
//! when the model call fails.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the page can also be
//! served from a separate origin during development.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::chat::{ChatError, ChatService};
use crate::config::Config;
use crate::llm::{create_client, ModelClient};
use crate::loader::{list_documents, load_documents};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Loads the document context once and wires it into a fresh
    /// [`ChatService`] backed by `client`.
    pub fn new(config: &Config, client: Arc<dyn ModelClient>) -> Self {
        let report = load_documents(&config.documents);
        let context = report.context();
        info!(
            documents = report.documents.len(),
            skipped = report.skipped.len(),
            chars = context.chars().count(),
            "loaded document context"
        );

        Self {
            config: Arc::new(config.clone()),
            chat: Arc::new(ChatService::new(&context, client)),
        }
    }
}

/// Starts the server with the model client selected in `[model]`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let client = create_client(&config.model)?;
    run_server_with_client(config, client).await
}

/// Starts the server with a caller-supplied model client.
pub async fn run_server_with_client(
    config: &Config,
    client: Arc<dyn ModelClient>,
) -> anyhow::Result<()> {
    let state = AppState::new(config, client);
    let app = build_router(state);

    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with all routes and layers attached.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/chat", post(handle_chat))
        .route("/reset", post(handle_reset))
        .route("/documents", get(handle_documents))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        let status = match err {
            ChatError::Validation => StatusCode::BAD_REQUEST,
            ChatError::ExternalService(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

// ============ POST /chat ============

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

/// Handler for `POST /chat`.
///
/// The body is parsed leniently: anything that does not yield a non-empty
/// string `message` is treated as a missing message.
async fn handle_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, AppError> {
    let message = extract_message(&body);
    let response = state.chat.handle(&message).await?;
    Ok(Json(ChatResponse { response }))
}

fn extract_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

// ============ POST /reset ============

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

async fn handle_reset(State(state): State<AppState>) -> Json<StatusResponse> {
    state.chat.reset().await;
    Json(StatusResponse {
        status: "Conversation reset".to_string(),
    })
}

// ============ GET /documents ============

#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<String>,
}

/// Handler for `GET /documents`.
///
/// Re-reads the document root on every call, so files added after startup
/// show up here even though they are not part of the prompt context.
async fn handle_documents(State(state): State<AppState>) -> Json<DocumentsResponse> {
    Json(DocumentsResponse {
        documents: list_documents(&state.config.documents.root),
    })
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
