//! ReAct pattern: reason, call tools, observe, repeat.
//!
//! The model sees the session history plus the new question and may request
//! tools. Each batch of tool calls is dispatched in emission order and the
//! results are threaded back as tool messages. The loop ends when the model
//! answers without tool calls or when the iteration cap is reached.
//!
//! # Cap semantics
//!
//! Every model call counts as one iteration. When the call that reaches the
//! cap still requests tools, those calls are discarded and the content of
//! that response becomes the answer (possibly empty). Reaching the cap is
//! not an error.

use smartflow_core::message::{Message, Role};
use smartflow_core::provider::Generation;
use smartflow_core::{AgentMode, AgentOutcome, IntermediateStep, ModelGateway, ToolRegistry};
use smartflow_memory::SessionStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::prompts;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Single-loop tool-calling agent.
pub struct ReactAgent {
    gateway: Arc<ModelGateway>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    max_iterations: usize,
}

impl ReactAgent {
    pub fn new(
        gateway: Arc<ModelGateway>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            gateway,
            tools,
            sessions,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set max iterations (at least one model call always happens).
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Answer `query` in `session_id`, injecting `rag_context` into the
    /// system message when non-empty.
    ///
    /// On success the session gains exactly two messages: the query and the
    /// final answer. If the model backend fails, only the query is recorded
    /// and the error is returned.
    pub async fn run(
        &self,
        query: &str,
        session_id: &str,
        rag_context: &str,
    ) -> smartflow_core::Result<AgentOutcome> {
        let mut log = self.sessions.get_or_create(session_id).await;
        log.push(Message::user(query));
        if log.first().is_none_or(|m| m.role != Role::System) {
            log.insert(0, Message::system(prompts::react_system(rag_context)));
        }
        let turn_start = log.len() - 1;

        let definitions = self.tools.definitions();
        let mut iterations = 0usize;
        let mut tool_calls_made = 0usize;

        info!(
            session_id,
            history = turn_start.saturating_sub(1),
            max_iter = self.max_iterations,
            rag = !rag_context.is_empty(),
            "ReAct loop starting"
        );

        let answer = loop {
            let generation = match self.gateway.generate(&log, &definitions).await {
                Ok(generation) => generation,
                Err(e) => {
                    warn!(session_id, iteration = iterations, error = %e, "ReAct: model call failed");
                    self.sessions.append(session_id, Message::user(query)).await;
                    return Err(e.into());
                }
            };
            iterations += 1;
            debug!(iteration = iterations, tool_calls = generation.has_tool_calls(), "ReAct iteration");

            match generation {
                Generation::Text { content } => {
                    log.push(Message::assistant(content.clone()));
                    break content;
                }
                Generation::ToolCalls { calls, content } => {
                    log.push(Message::assistant_with_tool_calls(
                        content.clone(),
                        calls.clone(),
                    ));

                    if iterations >= self.max_iterations {
                        warn!(
                            max_iter = self.max_iterations,
                            discarded = calls.len(),
                            "ReAct: max iterations reached, discarding pending tool calls"
                        );
                        break content;
                    }

                    for call in &calls {
                        tool_calls_made += 1;
                        debug!(tool = %call.name, arguments = %call.arguments, "Dispatching tool");
                        let output = self.tools.invoke(&call.name, &call.arguments).await;
                        log.push(Message::tool_result(&call.id, &call.name, output));
                    }
                }
            }
        };

        let intermediate_steps = collect_steps(&log[turn_start..]);

        self.sessions.append(session_id, Message::user(query)).await;
        self.sessions
            .append(session_id, Message::assistant(answer.clone()))
            .await;

        info!(
            session_id,
            iterations,
            tool_calls = tool_calls_made,
            "ReAct loop completed"
        );

        Ok(AgentOutcome {
            response: answer,
            intermediate_steps,
            sources: Vec::new(),
            plan: Vec::new(),
            agent_mode: AgentMode::React,
        })
    }
}

/// One step per requested tool call, paired with the first later tool
/// message carrying the same tool name (empty output when none follows).
pub fn collect_steps(messages: &[Message]) -> Vec<IntermediateStep> {
    let mut steps = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        for call in &message.tool_calls {
            let output = messages[i + 1..]
                .iter()
                .find(|m| m.role == Role::Tool && m.tool_name.as_deref() == Some(call.name.as_str()))
                .map(|m| m.content.clone())
                .unwrap_or_default();
            steps.push(IntermediateStep {
                tool: call.name.clone(),
                tool_input: call.arguments.clone(),
                output,
            });
        }
    }
    steps
}

// ── Tests ─────────────────────────────────────────────────────────────────
