//! Built-in tool implementations for SmartFlow.
//!
//! Tools give the agent access to arithmetic, web search, weather and the
//! business database. All of them are read-only over static data, and
//! every miss (unknown city, month, order) is answered with text that lists
//! the valid options so the model can retry.

pub mod calculator;
pub mod database;
pub mod weather;
pub mod web_search;

use smartflow_core::tool::ToolRegistry;

/// Create the registry with every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(calculator::CalculatorTool));
    registry.register(Box::new(web_search::WebSearchTool));
    registry.register(Box::new(weather::WeatherQueryTool));
    registry.register(Box::new(database::DatabaseQueryTool));
    tracing::debug!(tools = registry.len(), "Built-in tools registered");
    registry
}
