//! HTTP API gateway for SmartFlow.
//!
//! Exposes chat, knowledge-base and session endpoints under `/api`, and owns
//! the composition root that wires the model gateway, tools, memory and
//! agent loops together.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use smartflow_agent::{PlanExecuteAgent, ReactAgent, Supervisor};
use smartflow_config::AppConfig;
use smartflow_core::ModelGateway;
use smartflow_core::memory::VectorStore;
use smartflow_memory::{
    DocumentProcessor, FileVectorStore, InMemoryVectorStore, KnowledgeBase, Retriever,
    SessionStore,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Upload limit for `/api/documents/upload`.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub supervisor: Supervisor,
    pub sessions: Arc<SessionStore>,
    pub knowledge_base: Arc<KnowledgeBase>,
    pub documents: DocumentProcessor,
    /// Reported by `/api/health`
    pub llm_provider: String,
    pub model: String,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build the full service from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let gateway = smartflow_providers::build_gateway(config);
        Self::with_gateway(config, gateway)
    }

    /// Build the service around an already constructed model gateway.
    ///
    /// Both loops and the knowledge base share the one gateway and the one
    /// session store.
    pub fn with_gateway(config: &AppConfig, gateway: ModelGateway) -> Self {
        let gateway = Arc::new(gateway);
        let tools = Arc::new(smartflow_tools::default_registry());
        let sessions = Arc::new(SessionStore::new(config.memory.short_term_max_messages));

        let store: Arc<dyn VectorStore> = match &config.memory.persist_dir {
            Some(dir) => Arc::new(FileVectorStore::new(dir.clone())),
            None => Arc::new(InMemoryVectorStore::new()),
        };
        info!(store = store.name(), "Vector store ready");
        let knowledge_base = Arc::new(KnowledgeBase::new(store, gateway.clone()));
        let retriever = Arc::new(Retriever::new(knowledge_base.clone(), config.rag.top_k));

        let react = Arc::new(
            ReactAgent::new(gateway.clone(), tools.clone(), sessions.clone())
                .with_max_iterations(config.agent.max_iterations),
        );
        let plan_execute = Arc::new(
            PlanExecuteAgent::new(gateway.clone(), tools, sessions.clone())
                .with_max_steps(config.agent.max_steps)
                .with_max_iterations(config.agent.max_iterations),
        );
        let supervisor = Supervisor::new(gateway, react, plan_execute).with_retriever(retriever);

        Self {
            supervisor,
            sessions,
            knowledge_base,
            documents: DocumentProcessor::new(config.rag.chunk_size, config.rag.chunk_overlap),
            llm_provider: config.llm_provider.clone(),
            model: config.active_model().to_string(),
        }
    }
}

/// Build the Axum router with every route nested under `/api`.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .nest("/api", api::api_router(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(AppState::from_config(&config));

    info!(
        provider = %state.llm_provider,
        model = %state.model,
        "SmartFlow agent service starting"
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SmartFlow agent service shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
