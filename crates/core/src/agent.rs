//! Agent mode and outcome types shared by the loops, the router and the
//! HTTP surface.

use serde::{Deserialize, Serialize};

/// Which execution strategy handles a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    /// Let the router classify the query
    #[default]
    Auto,
    /// Single tool-calling loop
    React,
    /// Plan, execute each step, summarize
    #[serde(alias = "plan-execute")]
    PlanExecute,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Auto => "auto",
            AgentMode::React => "react",
            AgentMode::PlanExecute => "plan_execute",
        }
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(AgentMode::Auto),
            "react" => Ok(AgentMode::React),
            "plan_execute" | "plan-execute" => Ok(AgentMode::PlanExecute),
            other => Err(format!("unknown agent mode: {other}")),
        }
    }
}

/// One tool call (ReAct) or one executed plan step (Plan-Execute).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateStep {
    pub tool: String,
    pub tool_input: String,
    pub output: String,
}

/// What a loop hands back to its caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// The final answer
    pub response: String,

    pub intermediate_steps: Vec<IntermediateStep>,

    /// Collections whose content was injected into the prompt
    pub sources: Vec<String>,

    /// The executed plan (Plan-Execute only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plan: Vec<String>,

    /// The mode that actually ran
    pub agent_mode: AgentMode,
}
