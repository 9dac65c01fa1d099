//! Agent patterns: the two execution loops and the router between them.
//!
//! 1. **ReAct**: reason, call tools, observe, until a final answer
//! 2. **Plan-Execute**: plan steps, execute each with tools, summarize
//! 3. **Supervisor**: classifies the query and dispatches to one of the above
//!
//! Each loop reads and writes the shared [`smartflow_memory::SessionStore`].

pub mod plan_execute;
pub mod react;
pub mod supervisor;

pub use plan_execute::{PlanExecuteAgent, parse_plan_text};
pub use react::{ReactAgent, collect_steps};
pub use supervisor::Supervisor;

#[cfg(test)]
pub(crate) mod test_helpers;
