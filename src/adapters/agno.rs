//! Illustrative `agno` adapter: reasoning and thinking tools.
//!
//! Shape grounded in `app/adapters/agno_adapter.py` — the real adapter
//! wraps `AgnoToolsManager` and a reasoning toolkit; this stands in with
//! a deterministic "chain of thought" builder.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::adapter::{Adapter, AdapterState, BaseAdapter, FrameworkInfo};
use crate::context::ToolExecutionContext;
use crate::model::{Capability, ToolCategory, ToolSpec};
use crate::result::ToolResult;

/// In-process stand-in for the Agno reasoning/thinking framework.
pub struct AgnoAdapter {
    base: BaseAdapter,
    categories: Vec<ToolCategory>,
}

impl AgnoAdapter {
    /// Construct an uninitialized adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: BaseAdapter::new(),
            categories: vec![
                ToolCategory::Reasoning,
                ToolCategory::Thinking,
                ToolCategory::Knowledge,
                ToolCategory::Search,
                ToolCategory::AgenticSearch,
                ToolCategory::Chunking,
                ToolCategory::Custom,
            ],
        }
    }
}

impl Default for AgnoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for AgnoAdapter {
    fn provider_name(&self) -> &str {
        "agno"
    }

    fn supported_categories(&self) -> &[ToolCategory] {
        &self.categories
    }

    fn framework_info(&self) -> FrameworkInfo {
        FrameworkInfo {
            name: "agno".to_string(),
            version: "1.0.0".to_string(),
            description: "Reasoning and thinking toolkit adapter".to_string(),
            capabilities: vec![Capability::Reasoning, Capability::ToolCalling],
        }
    }

    fn state(&self) -> AdapterState {
        if self.base.is_initialized() {
            AdapterState::Ready
        } else {
            AdapterState::Uninitialized
        }
    }

    async fn initialize(&self) -> crate::Result<()> {
        self.base.insert(ToolSpec::new(
            "reasoning_chain",
            "1.0.0",
            "Builds a step-by-step chain of thought for a question",
            ToolCategory::Reasoning,
            self.provider_name(),
            json!({"properties": {"question": {"type": "string"}}, "required": ["question"]}),
            json!({"properties": {"steps": {"type": "array"}}}),
        ).with_capabilities(vec![Capability::Reasoning]));

        self.base.insert(ToolSpec::new(
            "think",
            "1.0.0",
            "Records a scratchpad thought without producing a final answer",
            ToolCategory::Thinking,
            self.provider_name(),
            json!({"properties": {"thought": {"type": "string"}}, "required": ["thought"]}),
            json!({"properties": {"acknowledged": {"type": "boolean"}}}),
        ));

        self.base.mark_initialized();
        Ok(())
    }

    async fn shutdown(&self) {
        self.base.mark_shutdown();
    }

    async fn discover_tools(&self, categories: Option<&[ToolCategory]>) -> Vec<ToolSpec> {
        self.base.discover(categories)
    }

    async fn get_tool_spec(&self, name: &str) -> Option<ToolSpec> {
        self.base.get(name)
    }

    async fn execute_tool(
        &self,
        name: &str,
        params: Value,
        context: &ToolExecutionContext,
    ) -> ToolResult {
        match name {
            "reasoning_chain" => {
                let Some(question) = params.get("question").and_then(Value::as_str) else {
                    return ToolResult::failure(
                        context.execution_id.clone(),
                        name,
                        "missing required parameter: question",
                        "invalid_params",
                    );
                };
                let steps = vec![
                    format!("Restate the question: {question}"),
                    "Identify the relevant facts".to_string(),
                    "Derive the answer from those facts".to_string(),
                ];
                ToolResult::success(context.execution_id.clone(), name, json!({"steps": steps}))
            }
            "think" => {
                let Some(thought) = params.get("thought").and_then(Value::as_str) else {
                    return ToolResult::failure(
                        context.execution_id.clone(),
                        name,
                        "missing required parameter: thought",
                        "invalid_params",
                    );
                };
                ToolResult::success(
                    context.execution_id.clone(),
                    name,
                    json!({"acknowledged": true, "length": thought.len()}),
                )
            }
            other => ToolResult::failure(
                context.execution_id.clone(),
                other,
                format!("unknown tool: {other}"),
                "tool_not_found",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reasoning_chain_restates_the_question() {
        let adapter = AgnoAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter
            .execute_tool("reasoning_chain", json!({"question": "why?"}), &ctx)
            .await;
        assert!(result.is_success());
        let steps = result.data.unwrap()["steps"].as_array().unwrap().len();
        assert_eq!(steps, 3);
    }

    #[tokio::test]
    async fn think_acknowledges_without_answering() {
        let adapter = AgnoAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("think", json!({"thought": "hmm"}), &ctx).await;
        assert!(result.is_success());
        assert_eq!(result.data.unwrap()["acknowledged"], true);
    }

    #[tokio::test]
    async fn unknown_tool_is_tool_not_found() {
        let adapter = AgnoAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("nope", json!({}), &ctx).await;
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("tool_not_found"));
    }
}
