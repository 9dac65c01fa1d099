//! Supervisor: picks a loop for each query and runs it.
//!
//! ```text
//! query ─▶ [retrieve context] ─▶ resolve mode ─┬─▶ ReactAgent
//!                                              └─▶ PlanExecuteAgent
//! ```
//!
//! Retrieval happens before classification so both loops see the same
//! context. In `auto` mode one classifier call decides; anything that is not
//! clearly the plan-execute token, including a failed call, routes to ReAct.

use smartflow_core::message::Message;
use smartflow_core::{AgentMode, AgentOutcome, ModelGateway};
use smartflow_memory::Retriever;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::patterns::plan_execute::PlanExecuteAgent;
use crate::patterns::react::ReactAgent;
use crate::prompts;

/// Routes queries to the ReAct or Plan-Execute loop.
///
/// Built once by the composition root and shared by every request.
pub struct Supervisor {
    gateway: Arc<ModelGateway>,
    react: Arc<ReactAgent>,
    plan_execute: Arc<PlanExecuteAgent>,
    retriever: Option<Arc<Retriever>>,
}

impl Supervisor {
    pub fn new(
        gateway: Arc<ModelGateway>,
        react: Arc<ReactAgent>,
        plan_execute: Arc<PlanExecuteAgent>,
    ) -> Self {
        Self {
            gateway,
            react,
            plan_execute,
            retriever: None,
        }
    }

    /// Enable retrieval-augmented turns.
    pub fn with_retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Answer `query` with the loop selected by `mode`.
    ///
    /// With `use_rag`, context is retrieved from `collection_name` first; an
    /// empty result is the same as RAG being off, and `sources` then stays
    /// empty. The returned outcome carries the mode that actually ran.
    pub async fn route(
        &self,
        query: &str,
        session_id: &str,
        mode: AgentMode,
        use_rag: bool,
        collection_name: &str,
    ) -> smartflow_core::Result<AgentOutcome> {
        let rag_context = if use_rag {
            self.retrieve(query, collection_name).await?
        } else {
            String::new()
        };

        let resolved = match mode {
            AgentMode::Auto => self.classify(query).await,
            explicit => explicit,
        };
        info!(
            session_id,
            requested = %mode,
            resolved = %resolved,
            rag = !rag_context.is_empty(),
            "Routing query"
        );

        let mut outcome = match resolved {
            AgentMode::PlanExecute => {
                self.plan_execute
                    .run(query, session_id, &rag_context)
                    .await?
            }
            _ => self.react.run(query, session_id, &rag_context).await?,
        };

        outcome.agent_mode = resolved;
        if !rag_context.is_empty() {
            outcome.sources = vec![collection_name.to_string()];
        }
        Ok(outcome)
    }

    /// Ask the model whether `query` needs planning. Errors route to ReAct.
    pub async fn classify(&self, query: &str) -> AgentMode {
        let messages = vec![
            Message::system(prompts::CLASSIFIER_PROMPT),
            Message::user(query),
        ];

        match self.gateway.generate(&messages, &[]).await {
            Ok(generation) => {
                let label = generation.content().trim().to_lowercase();
                debug!(label = %label, "Classifier answered");
                if label.contains("plan") {
                    AgentMode::PlanExecute
                } else {
                    AgentMode::React
                }
            }
            Err(e) => {
                warn!(error = %e, "Classifier failed, defaulting to react");
                AgentMode::React
            }
        }
    }

    async fn retrieve(&self, query: &str, collection: &str) -> smartflow_core::Result<String> {
        let Some(retriever) = &self.retriever else {
            warn!("RAG requested but no retriever is configured");
            return Ok(String::new());
        };
        let context = retriever.retrieve_as_context(query, collection).await?;
        debug!(collection, found = !context.is_empty(), "Retrieved context");
        Ok(context)
    }
}
