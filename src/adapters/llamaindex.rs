//! Illustrative `llamaindex` adapter: knowledge base and search tools.
//!
//! Shape grounded in `app/adapters/llamaindex_adapter.py` — the real
//! adapter wraps document indexes and an Elasticsearch store; this stands
//! in with a small in-memory document set.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::adapter::{Adapter, AdapterState, BaseAdapter, FrameworkInfo};
use crate::context::ToolExecutionContext;
use crate::model::{Capability, ToolCategory, ToolSpec};
use crate::result::ToolResult;

const DOCUMENTS: &[(&str, &str)] = &[
    ("intro", "Toolmesh unifies heterogeneous AI-agent tool providers behind one contract."),
    ("registry", "The Unified Registry indexes tools by name, category, and provider."),
    ("coordinator", "The Execution Coordinator bounds concurrency and tracks execution status."),
];

/// In-process stand-in for a LlamaIndex-backed knowledge base.
pub struct LlamaIndexAdapter {
    base: BaseAdapter,
    categories: Vec<ToolCategory>,
}

impl LlamaIndexAdapter {
    /// Construct an uninitialized adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: BaseAdapter::new(),
            categories: vec![
                ToolCategory::Knowledge,
                ToolCategory::Search,
                ToolCategory::FileManagement,
                ToolCategory::Integration,
            ],
        }
    }
}

impl Default for LlamaIndexAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for LlamaIndexAdapter {
    fn provider_name(&self) -> &str {
        "llamaindex"
    }

    fn supported_categories(&self) -> &[ToolCategory] {
        &self.categories
    }

    fn framework_info(&self) -> FrameworkInfo {
        FrameworkInfo {
            name: "llamaindex".to_string(),
            version: "1.0.0".to_string(),
            description: "Knowledge base indexing and retrieval adapter".to_string(),
            capabilities: vec![Capability::KnowledgeBase, Capability::RagRetrieval],
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
            "search",
            "1.0.0",
            "Keyword search over the indexed knowledge base",
            ToolCategory::Search,
            self.provider_name(),
            json!({"properties": {"query": {"type": "string"}}, "required": ["query"]}),
            json!({"properties": {"matches": {"type": "array"}}}),
        ).with_capabilities(vec![Capability::RagRetrieval]));

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
        if name != "search" {
            return ToolResult::failure(
                context.execution_id.clone(),
                name,
                format!("unknown tool: {name}"),
                "tool_not_found",
            );
        }
        let Some(query) = params.get("query").and_then(Value::as_str) else {
            return ToolResult::failure(
                context.execution_id.clone(),
                name,
                "missing required parameter: query",
                "invalid_params",
            );
        };
        let needle = query.to_lowercase();
        let matches: Vec<Value> = DOCUMENTS
            .iter()
            .filter(|(_, body)| body.to_lowercase().contains(&needle))
            .map(|(id, body)| json!({"id": id, "text": body}))
            .collect();
        ToolResult::success(context.execution_id.clone(), name, json!({"matches": matches}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_finds_matching_documents() {
        let adapter = LlamaIndexAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("search", json!({"query": "coordinator"}), &ctx).await;
        assert!(result.is_success());
        let matches = result.data.unwrap()["matches"].as_array().unwrap().len();
        assert_eq!(matches, 1);
    }

    #[tokio::test]
    async fn search_without_hits_returns_empty_matches() {
        let adapter = LlamaIndexAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("search", json!({"query": "nonexistent"}), &ctx).await;
        assert!(result.is_success());
        assert!(result.data.unwrap()["matches"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_query_is_invalid_params() {
        let adapter = LlamaIndexAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("search", json!({}), &ctx).await;
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("invalid_params"));
    }
}
