//! The agent execution core of SmartFlow.
//!
//! Two loops drive the model through tool-calling cycles:
//!
//! 1. **ReAct**: the model reasons and calls tools until it answers or the
//!    iteration cap is hit
//! 2. **Plan-Execute**: the model decomposes the task, each step runs with
//!    tools on its own thread, and a final pass summarizes the results
//!
//! The [`Supervisor`] picks a loop per query and optionally injects
//! knowledge-base context retrieved before dispatch.

pub mod patterns;
pub mod prompts;

pub use patterns::{PlanExecuteAgent, ReactAgent, Supervisor};
