//! Illustrative `haystack` adapter: reasoning and document-chunking tools.
//!
//! Shape grounded in `app/adapters/haystack_adapter.py` — the real adapter
//! wraps Haystack readers and retrievers; this stands in with a
//! deterministic whitespace-based chunker.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::adapter::{Adapter, AdapterState, BaseAdapter, FrameworkInfo};
use crate::context::ToolExecutionContext;
use crate::model::{Capability, ToolCategory, ToolSpec};
use crate::result::ToolResult;

/// In-process stand-in for the Haystack reader/retriever framework.
pub struct HaystackAdapter {
    base: BaseAdapter,
    categories: Vec<ToolCategory>,
}

impl HaystackAdapter {
    /// Construct an uninitialized adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: BaseAdapter::new(),
            categories: vec![ToolCategory::Reasoning, ToolCategory::Knowledge, ToolCategory::Chunking],
        }
    }
}

impl Default for HaystackAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for HaystackAdapter {
    fn provider_name(&self) -> &str {
        "haystack"
    }

    fn supported_categories(&self) -> &[ToolCategory] {
        &self.categories
    }

    fn framework_info(&self) -> FrameworkInfo {
        FrameworkInfo {
            name: "haystack".to_string(),
            version: "1.0.0".to_string(),
            description: "Document chunking and reasoning adapter".to_string(),
            capabilities: vec![Capability::DocumentProcessing, Capability::Reasoning],
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
            "chunk_text",
            "1.0.0",
            "Splits input text into whitespace-bounded chunks of roughly `chunk_size` words",
            ToolCategory::Chunking,
            self.provider_name(),
            json!({"properties": {"text": {"type": "string"}, "chunk_size": {"type": "integer"}}, "required": ["text"]}),
            json!({"properties": {"chunks": {"type": "array"}}}),
        ).with_capabilities(vec![Capability::DocumentProcessing]));

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
        if name != "chunk_text" {
            return ToolResult::failure(
                context.execution_id.clone(),
                name,
                format!("unknown tool: {name}"),
                "tool_not_found",
            );
        }
        let Some(text) = params.get("text").and_then(Value::as_str) else {
            return ToolResult::failure(
                context.execution_id.clone(),
                name,
                "missing required parameter: text",
                "invalid_params",
            );
        };
        let chunk_size = usize::try_from(params.get("chunk_size").and_then(Value::as_u64).unwrap_or(20).max(1))
            .unwrap_or(usize::MAX);
        let words: Vec<&str> = text.split_whitespace().collect();
        let chunks: Vec<String> = words
            .chunks(chunk_size)
            .map(|chunk| chunk.join(" "))
            .collect();
        ToolResult::success(context.execution_id.clone(), name, json!({"chunks": chunks}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunk_text_splits_on_word_count() {
        let adapter = HaystackAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let text = "one two three four five";
        let result = adapter.execute_tool("chunk_text", json!({"text": text, "chunk_size": 2}), &ctx).await;
        assert!(result.is_success());
        let chunks = result.data.unwrap()["chunks"].as_array().unwrap().len();
        assert_eq!(chunks, 3);
    }

    #[tokio::test]
    async fn missing_text_is_invalid_params() {
        let adapter = HaystackAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("chunk_text", json!({}), &ctx).await;
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("invalid_params"));
    }
}
