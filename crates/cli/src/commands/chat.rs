//! `smartflow chat`: Run one turn through the same stack the server uses.

use smartflow_core::{AgentMode, AgentOutcome};
use smartflow_gateway::AppState;
use std::path::Path;

pub struct ChatArgs {
    pub message: String,
    pub mode: String,
    pub session: String,
    pub rag: bool,
    pub collection: String,
}

pub async fn run(
    config_path: Option<&Path>,
    args: ChatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let mode: AgentMode = args.mode.parse()?;

    let state = AppState::from_config(&config);
    let outcome = state
        .supervisor
        .route(
            &args.message,
            &args.session,
            mode,
            args.rag,
            &args.collection,
        )
        .await?;

    print!("{}", render(&outcome));
    Ok(())
}

/// Terminal rendering of one turn: the answer, then plan and steps if any.
fn render(outcome: &AgentOutcome) -> String {
    let mut out = format!("[{}] {}\n", outcome.agent_mode, outcome.response);

    if !outcome.plan.is_empty() {
        out.push_str("\nPlan:\n");
        for (i, step) in outcome.plan.iter().enumerate() {
            out.push_str(&format!("  {}. {step}\n", i + 1));
        }
    }

    if !outcome.intermediate_steps.is_empty() {
        out.push_str("\nSteps:\n");
        for step in &outcome.intermediate_steps {
            out.push_str(&format!(
                "  - {}({}) -> {}\n",
                step.tool, step.tool_input, step.output
            ));
        }
    }

    if !outcome.sources.is_empty() {
        out.push_str(&format!("\nSources: {}\n", outcome.sources.join(", ")));
    }
    out
}
