//! HTTP API: chat, knowledge base, session memory and health.
//!
//! Endpoints (nested under `/api`):
//!
//! - `POST   /chat`                               Run one agent turn
//! - `POST   /documents/upload`                   Index a .pdf/.txt/.md file
//! - `GET    /documents/collections`              List collections
//! - `DELETE /documents/collections/{name}`       Drop a collection
//! - `POST   /memory/clear?session_id=`           Forget a session
//! - `GET    /memory/sessions`                    List live sessions
//! - `GET    /health`                             Provider and model in use
//!
//! Failures are answered with `{"detail": "..."}`.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use smartflow_core::{AgentMode, AgentOutcome, CollectionInfo, IntermediateStep};
use smartflow_memory::{ALLOWED_EXTENSIONS, DocumentProcessor};

use crate::SharedState;

const DEFAULT_SESSION: &str = "default";
const DEFAULT_COLLECTION: &str = "default";

// ── Router ────────────────────────────────────────────────────────────────

/// Build the API router. Nest this under "/api" in the main router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/documents/upload", post(upload_handler))
        .route("/documents/collections", get(list_collections_handler))
        .route(
            "/documents/collections/{name}",
            delete(delete_collection_handler),
        )
        .route("/memory/clear", post(clear_memory_handler))
        .route("/memory/sessions", get(list_sessions_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session")]
    pub session_id: String,
    /// "auto", "react" or "plan_execute"
    #[serde(default = "default_agent_mode")]
    pub agent_mode: String,
    #[serde(default)]
    pub use_rag: bool,
    #[serde(default = "default_collection")]
    pub collection_name: String,
}

fn default_session() -> String {
    DEFAULT_SESSION.into()
}
fn default_agent_mode() -> String {
    AgentMode::Auto.as_str().into()
}
fn default_collection() -> String {
    DEFAULT_COLLECTION.into()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub intermediate_steps: Vec<IntermediateStep>,
    pub sources: Vec<String>,
    pub agent_mode: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plan: Vec<String>,
}

impl From<AgentOutcome> for ChatResponse {
    fn from(outcome: AgentOutcome) -> Self {
        Self {
            response: outcome.response,
            intermediate_steps: outcome.intermediate_steps,
            sources: outcome.sources,
            agent_mode: outcome.agent_mode.to_string(),
            plan: outcome.plan,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub collection_name: String,
    pub num_chunks: usize,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub llm_provider: String,
    pub model: String,
}

#[derive(Deserialize)]
pub struct ClearMemoryParams {
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

// ── Chat ──────────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let mode = payload.agent_mode.parse::<AgentMode>().unwrap_or_else(|e| {
        warn!(error = %e, "Unknown agent mode, using react");
        AgentMode::React
    });
    info!(
        session_id = %payload.session_id,
        mode = %mode,
        use_rag = payload.use_rag,
        "Chat request"
    );

    let outcome = state
        .supervisor
        .route(
            &payload.message,
            &payload.session_id,
            mode,
            payload.use_rag,
            &payload.collection_name,
        )
        .await
        .map_err(|e| {
            error!(error = %e, "Chat error");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Agent execution error: {e}"),
            )
        })?;

    Ok(Json(outcome.into()))
}

// ── Documents ─────────────────────────────────────────────────────────────

async fn upload_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut collection_name = default_collection();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
                upload = Some((filename, bytes.to_vec()));
            }
            "collection_name" => {
                collection_name = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
            }
            _ => {}
        }
    }

    let Some((filename, content)) = upload.filter(|(filename, _)| !filename.is_empty()) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "No file provided"));
    };

    if !DocumentProcessor::is_supported(&filename) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!(
                "Unsupported file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        ));
    }

    let chunks = state
        .documents
        .load_bytes(&content, &filename)
        .map_err(|e| {
            warn!(error = %e, filename = %filename, "Rejected unreadable document");
            api_error(StatusCode::BAD_REQUEST, format!("Could not read {filename}: {e}"))
        })?;
    let num_chunks = state
        .knowledge_base
        .add_documents(chunks, &collection_name)
        .await
        .map_err(|e| {
            error!(error = %e, filename = %filename, "Document upload error");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Upload failed: {e}"),
            )
        })?;

    info!(filename = %filename, collection = %collection_name, num_chunks, "Document uploaded");
    Ok(Json(UploadResponse {
        message: format!("Successfully uploaded {filename}: {num_chunks} chunks indexed."),
        collection_name,
        num_chunks,
    }))
}

async fn list_collections_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<CollectionInfo>>, ApiError> {
    state
        .knowledge_base
        .list_collections()
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn delete_collection_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state
        .knowledge_base
        .delete_collection(&name)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if !deleted {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Collection '{name}' not found"),
        ));
    }
    info!(collection = %name, "Collection deleted");
    Ok(Json(MessageResponse {
        message: format!("Collection '{name}' deleted."),
    }))
}

// ── Memory ────────────────────────────────────────────────────────────────

async fn clear_memory_handler(
    State(state): State<SharedState>,
    Query(params): Query<ClearMemoryParams>,
) -> Json<MessageResponse> {
    let session_id = params.session_id;
    let message = if state.sessions.clear(&session_id).await {
        format!("Session '{session_id}' cleared.")
    } else {
        format!("Session '{session_id}' not found (already empty).")
    };
    Json(MessageResponse { message })
}

async fn list_sessions_handler(State(state): State<SharedState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.sessions.list_ids().await,
    })
}

// ── Health ────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        llm_provider: state.llm_provider.clone(),
        model: state.model.clone(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use smartflow_config::AppConfig;
    use smartflow_core::ModelGateway;
    use smartflow_core::error::ProviderError;
    use smartflow_core::provider::{
        EmbeddingRequest, EmbeddingResponse, Generation, Provider, ProviderRequest,
        ProviderResponse,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "smartflow-test-boundary";

    /// Lightweight mock provider for gateway tests: one fixed answer for
    /// every completion, or a network failure when `reply` is `None`.
    struct MockProvider {
        reply: Option<String>,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            match &self.reply {
                Some(text) => Ok(ProviderResponse {
                    output: Generation::Text {
                        content: text.clone(),
                    },
                    usage: None,
                    model: "mock-model".into(),
                }),
                None => Err(ProviderError::Network("connection refused".into())),
            }
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: request.inputs.iter().map(|_| vec![1.0, 0.0]).collect(),
                model: request.model,
            })
        }
    }

    fn test_state(reply: Option<&str>) -> SharedState {
        let provider = Arc::new(MockProvider {
            reply: reply.map(String::from),
        });
        let gateway = ModelGateway::new(provider, "mock-model");
        Arc::new(AppState::with_gateway(&AppConfig::default(), gateway))
    }

    async fn send(state: &SharedState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = api_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/documents/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_answer() {
        let state = test_state(Some("Mock answer"));
        let (status, json) = send(
            &state,
            post_json("/chat", serde_json::json!({"message": "你好", "agent_mode": "react"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Mock answer");
        assert_eq!(json["agent_mode"], "react");
        assert_eq!(json["sources"], serde_json::json!([]));
        assert_eq!(json["intermediate_steps"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn chat_defaults_to_auto_and_default_session() {
        let state = test_state(Some("Mock answer"));
        let (status, json) =
            send(&state, post_json("/chat", serde_json::json!({"message": "你好"}))).await;

        // The classifier answer does not mention planning, so ReAct runs.
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["agent_mode"], "react");
        assert_eq!(state.sessions.list_ids().await, vec!["default"]);
    }

    #[tokio::test]
    async fn chat_unknown_mode_falls_back_to_react() {
        let state = test_state(Some("Mock answer"));
        let (status, json) = send(
            &state,
            post_json(
                "/chat",
                serde_json::json!({"message": "你好", "agent_mode": "swarm"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["agent_mode"], "react");
    }

    #[tokio::test]
    async fn chat_gateway_failure_is_500() {
        let state = test_state(None);
        let (status, json) = send(
            &state,
            post_json(
                "/chat",
                serde_json::json!({"message": "你好", "agent_mode": "react", "session_id": "s1"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = json["detail"].as_str().unwrap();
        assert!(detail.starts_with("Agent execution error: "));
        assert!(detail.contains("connection refused"));

        // The query alone is remembered.
        assert_eq!(state.sessions.history("s1").await.len(), 1);
    }

    #[tokio::test]
    async fn memory_clear_and_list() {
        let state = test_state(Some("Mock answer"));
        send(
            &state,
            post_json(
                "/chat",
                serde_json::json!({"message": "hi", "agent_mode": "react", "session_id": "abc"}),
            ),
        )
        .await;

        let (_, json) = send(&state, get("/memory/sessions")).await;
        assert_eq!(json["sessions"], serde_json::json!(["abc"]));

        let clear = || {
            Request::builder()
                .method("POST")
                .uri("/memory/clear?session_id=abc")
                .body(Body::empty())
                .unwrap()
        };
        let (status, json) = send(&state, clear()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Session 'abc' cleared.");

        let (_, json) = send(&state, clear()).await;
        assert_eq!(json["message"], "Session 'abc' not found (already empty).");
    }

    #[tokio::test]
    async fn memory_clear_defaults_session_id() {
        let state = test_state(Some("Mock answer"));
        let req = Request::builder()
            .method("POST")
            .uri("/memory/clear")
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["message"],
            "Session 'default' not found (already empty)."
        );
    }

    #[tokio::test]
    async fn upload_indexes_and_lists_collection() {
        let state = test_state(Some("Mock answer"));
        let (status, json) = send(
            &state,
            multipart(&[
                ("collection_name", None, "kb"),
                ("file", Some("policy.txt"), "退货需在7天内申请"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["collection_name"], "kb");
        assert_eq!(json["num_chunks"], 1);
        assert_eq!(
            json["message"],
            "Successfully uploaded policy.txt: 1 chunks indexed."
        );

        let (status, json) = send(&state, get("/documents/collections")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([{"name": "kb", "count": 1}]));
    }

    #[tokio::test]
    async fn upload_defaults_collection_name() {
        let state = test_state(Some("Mock answer"));
        let (status, json) =
            send(&state, multipart(&[("file", Some("NOTES.MD"), "# 笔记")])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["collection_name"], "default");
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_extension() {
        let state = test_state(Some("Mock answer"));
        let (status, json) = send(&state, multipart(&[("file", Some("data.csv"), "a,b")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["detail"],
            "Unsupported file type. Allowed: .pdf, .txt, .md"
        );
    }

    #[tokio::test]
    async fn upload_without_file_is_rejected() {
        let state = test_state(Some("Mock answer"));
        let (status, json) = send(&state, multipart(&[("collection_name", None, "kb")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "No file provided");
    }

    #[tokio::test]
    async fn upload_of_unreadable_pdf_is_rejected() {
        let state = test_state(Some("Mock answer"));
        let (status, json) =
            send(&state, multipart(&[("file", Some("broken.pdf"), "not a pdf")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["detail"].as_str().unwrap().starts_with("Could not read broken.pdf: "));

        let (_, listed) = send(&state, get("/documents/collections")).await;
        assert_eq!(listed, serde_json::json!([]));
    }

    #[tokio::test]
    async fn upload_storage_failure_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a regular file").unwrap();
        let mut config = AppConfig::default();
        config.memory.persist_dir = Some(blocker.join("store"));
        let provider = Arc::new(MockProvider {
            reply: Some("Mock answer".into()),
        });
        let gateway = ModelGateway::new(provider, "mock-model");
        let state: SharedState = Arc::new(AppState::with_gateway(&config, gateway));

        let (status, json) =
            send(&state, multipart(&[("file", Some("policy.txt"), "退货需在7天内申请")])).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().starts_with("Upload failed: "));
        let (_, listed) = send(&state, get("/documents/collections")).await;
        assert_eq!(listed, serde_json::json!([]));
    }

    #[tokio::test]
    async fn delete_collection_then_404() {
        let state = test_state(Some("Mock answer"));
        send(
            &state,
            multipart(&[
                ("collection_name", None, "kb"),
                ("file", Some("policy.txt"), "退货需在7天内申请"),
            ]),
        )
        .await;

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri("/documents/collections/kb")
                .body(Body::empty())
                .unwrap()
        };
        let (status, json) = send(&state, delete()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Collection 'kb' deleted.");

        let (status, json) = send(&state, delete()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "Collection 'kb' not found");
    }

    #[tokio::test]
    async fn rag_chat_reports_collection_as_source() {
        let state = test_state(Some("7天内可退货"));
        send(
            &state,
            multipart(&[
                ("collection_name", None, "kb"),
                ("file", Some("policy.txt"), "退货需在7天内申请"),
            ]),
        )
        .await;

        let (status, json) = send(
            &state,
            post_json(
                "/chat",
                serde_json::json!({
                    "message": "怎么退货",
                    "agent_mode": "react",
                    "use_rag": true,
                    "collection_name": "kb"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sources"], serde_json::json!(["kb"]));
    }
}
