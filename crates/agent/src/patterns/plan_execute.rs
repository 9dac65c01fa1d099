//! Plan-and-Execute pattern: decompose, run each step, summarize.
//!
//! ```text
//! planning ──▶ executing ──▶ summarizing ──▶ done
//!                 │  ▲
//!                 ▼  │
//!             tool-dispatch
//! ```
//!
//! The planner asks for a typed step list first and falls back to parsing
//! free text when the backend cannot produce structured output. Each step
//! runs on a fresh thread that only carries a recap of earlier results, not
//! the outer conversation. The summarizer's answer is the only assistant
//! turn written to the session.

use serde::Deserialize;
use smartflow_core::message::{Message, Role};
use smartflow_core::provider::{Generation, OutputSchema};
use smartflow_core::{AgentMode, AgentOutcome, IntermediateStep, ModelGateway, ToolRegistry};
use smartflow_memory::SessionStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::patterns::react::DEFAULT_MAX_ITERATIONS;
use crate::prompts;

pub const DEFAULT_MAX_STEPS: usize = 10;

/// The planner's structured output.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub steps: Vec<String>,
}

impl Plan {
    pub fn schema() -> OutputSchema {
        OutputSchema::new(
            "plan",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "array",
                        "description": "Ordered list of steps to complete the task",
                        "items": { "type": "string" }
                    }
                },
                "required": ["steps"],
                "additionalProperties": false
            }),
        )
    }
}

/// Two-phase agent: plan once, execute steps in order, then summarize.
pub struct PlanExecuteAgent {
    gateway: Arc<ModelGateway>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    /// Global cap on executed steps.
    max_steps: usize,
    /// Cap on model calls within one step.
    max_iterations: usize,
}

impl PlanExecuteAgent {
    pub fn new(
        gateway: Arc<ModelGateway>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            gateway,
            tools,
            sessions,
            max_steps: DEFAULT_MAX_STEPS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Plan, execute and summarize `query` in `session_id`.
    ///
    /// Session writes mirror the ReAct loop: query plus summary on success,
    /// the query alone when the model backend fails.
    pub async fn run(
        &self,
        query: &str,
        session_id: &str,
        rag_context: &str,
    ) -> smartflow_core::Result<AgentOutcome> {
        let mut thread = self.sessions.get_or_create(session_id).await;
        thread.push(Message::user(query));

        match self.execute(query, rag_context, &mut thread).await {
            Ok(outcome) => {
                self.sessions.append(session_id, Message::user(query)).await;
                self.sessions
                    .append(session_id, Message::assistant(outcome.response.clone()))
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                warn!(session_id, error = %e, "Plan-Execute: model call failed");
                self.sessions.append(session_id, Message::user(query)).await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        query: &str,
        rag_context: &str,
        thread: &mut Vec<Message>,
    ) -> smartflow_core::Result<AgentOutcome> {
        // ── Planning ──
        let plan = self.plan(query).await?;
        info!(steps = plan.len(), "Plan-Execute: plan ready");

        // ── Executing ──
        let mut results: Vec<String> = Vec::new();
        let mut index = 0usize;
        while index < plan.len() && index < self.max_steps {
            let step = &plan[index];
            debug!(step = index + 1, description = %step, "Plan-Execute: executing step");

            let recap = recap(&plan, &results);
            let mut step_thread = vec![
                Message::system(prompts::executor_system(step, &recap, rag_context)),
                Message::user(prompts::executor_human(step)),
            ];
            let result = self.run_step(&mut step_thread).await?;
            thread.extend(step_thread.into_iter().skip(2));

            results.push(result);
            index += 1;
        }
        if index < plan.len() {
            warn!(
                executed = index,
                planned = plan.len(),
                "Plan-Execute: step cap reached"
            );
        }

        // ── Summarizing ──
        let plan_text = plan
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {s}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        let messages = vec![
            Message::system(prompts::summarizer_system(
                query,
                &plan_text,
                &results_text(&results, thread),
            )),
            Message::user(prompts::SUMMARIZER_HUMAN),
        ];
        let response = self.gateway.generate(&messages, &[]).await?.content().to_string();

        let intermediate_steps = plan
            .iter()
            .zip(&results)
            .enumerate()
            .map(|(i, (step, output))| IntermediateStep {
                tool: format!("步骤{}", i + 1),
                tool_input: step.clone(),
                output: output.clone(),
            })
            .collect();

        info!(executed = results.len(), "Plan-Execute loop completed");

        Ok(AgentOutcome {
            response,
            intermediate_steps,
            sources: Vec::new(),
            plan,
            agent_mode: AgentMode::PlanExecute,
        })
    }

    /// Decompose `query` into at least one step.
    async fn plan(&self, query: &str) -> smartflow_core::Result<Vec<String>> {
        let messages = vec![
            Message::system(prompts::PLANNER_PROMPT),
            Message::user(prompts::planner_human(query)),
        ];

        let steps = match self
            .gateway
            .generate_structured::<Plan>(&messages, &Plan::schema())
            .await
        {
            Ok(plan) => plan
                .steps
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(e) => {
                debug!(error = %e, "Structured plan unavailable, parsing free text");
                let generation = self.gateway.generate(&messages, &[]).await?;
                parse_plan_text(generation.content())
            }
        };

        if steps.is_empty() {
            Ok(vec![prompts::FALLBACK_STEP.to_string()])
        } else {
            Ok(steps)
        }
    }

    /// Drive one step's thread until the model answers without tool calls.
    async fn run_step(&self, thread: &mut Vec<Message>) -> smartflow_core::Result<String> {
        let definitions = self.tools.definitions();
        let mut rounds = 0usize;

        loop {
            let generation = self.gateway.generate(thread, &definitions).await?;
            rounds += 1;

            match generation {
                Generation::Text { content } => {
                    thread.push(Message::assistant(content.clone()));
                    return Ok(content);
                }
                Generation::ToolCalls { calls, content } => {
                    thread.push(Message::assistant_with_tool_calls(
                        content.clone(),
                        calls.clone(),
                    ));
                    if rounds >= self.max_iterations {
                        warn!(rounds, "Plan-Execute: step round cap reached");
                        return Ok(content);
                    }
                    for call in &calls {
                        debug!(tool = %call.name, "Dispatching tool");
                        let output = self.tools.invoke(&call.name, &call.arguments).await;
                        thread.push(Message::tool_result(&call.id, &call.name, output));
                    }
                }
            }
        }
    }
}

/// Parse a numbered or bulleted list into step strings.
///
/// Strips a numeric prefix (at most three characters before `.`, `)` or
/// `、`) and a leading `- `; blank lines are skipped.
pub fn parse_plan_text(text: &str) -> Vec<String> {
    let mut steps = Vec::new();
    for raw in text.trim().lines() {
        let mut line = raw.trim();
        if line.is_empty() {
            continue;
        }

        for delimiter in ['.', ')', '、'] {
            if let Some(idx) = line.find(delimiter) {
                let prefix = &line[..idx];
                let digits = prefix.trim();
                if prefix.chars().count() < 4
                    && !digits.is_empty()
                    && digits.chars().all(|c| c.is_ascii_digit())
                {
                    line = line[idx + delimiter.len_utf8()..].trim();
                    break;
                }
            }
        }

        if let Some(rest) = line.strip_prefix("- ") {
            line = rest.trim();
        }

        if !line.is_empty() {
            steps.push(line.to_string());
        }
    }
    steps
}

/// Recap of completed steps for the executor prompt.
fn recap(plan: &[String], results: &[String]) -> String {
    if results.is_empty() {
        return prompts::NO_PREVIOUS_RESULTS.to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("步骤 {}: {}\n结果: {r}", i + 1, plan[i]))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered step results, or the last assistant contents when nothing ran.
fn results_text(results: &[String], thread: &[Message]) -> String {
    if !results.is_empty() {
        return results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("步骤 {}: {r}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let recent: Vec<&str> = thread
        .iter()
        .filter(|m| m.role == Role::Assistant && !m.content.is_empty())
        .map(|m| m.content.as_str())
        .collect();
    if recent.is_empty() {
        prompts::EXECUTION_COMPLETE.to_string()
    } else {
        recent[recent.len().saturating_sub(3)..].join("\n")
    }
}
