//! Tool Specification Model — immutable value types describing a tool's
//! identity, schema, and capabilities.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Closed enum partitioning tools by high-level purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Chain-of-thought or multi-step reasoning tools.
    Reasoning,
    /// Lightweight "think" scratchpad tools.
    Thinking,
    /// Knowledge-base lookup tools.
    Knowledge,
    /// Plain search tools.
    Search,
    /// Agent-driven iterative search tools.
    AgenticSearch,
    /// Document chunking/splitting tools.
    Chunking,
    /// Arithmetic/calculator tools.
    Calculator,
    /// File management tools.
    FileManagement,
    /// Tools surfaced through the MCP protocol.
    Mcp,
    /// Anything not covered by the other categories.
    Custom,
    /// Third-party system integrations.
    Integration,
}

impl ToolCategory {
    /// All enum members, used by the `/tools/categories` bridge route.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Reasoning,
            Self::Thinking,
            Self::Knowledge,
            Self::Search,
            Self::AgenticSearch,
            Self::Chunking,
            Self::Calculator,
            Self::FileManagement,
            Self::Mcp,
            Self::Custom,
            Self::Integration,
        ]
    }
}

/// A documented capability tag an adapter or tool may advertise, with an
/// `Other` escape hatch so adapter-specific tags don't need a crate release
/// to add.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Can create new agent instances.
    AgentCreation,
    /// Supports multi-turn conversation.
    Conversation,
    /// Chain-of-thought reasoning.
    Reasoning,
    /// Multi-step planning.
    Planning,
    /// Can be invoked as a callable tool.
    ToolCalling,
    /// Supports dynamic tool registration.
    ToolRegistration,
    /// Supports user-defined custom tools.
    CustomTools,
    /// Supports batched invocation.
    BatchTools,
    /// Backed by a knowledge base.
    KnowledgeBase,
    /// Retrieval-augmented generation.
    RagRetrieval,
    /// Semantic/embedding-based search.
    SemanticSearch,
    /// Document processing pipeline.
    DocumentProcessing,
    /// Coordinates multiple agents.
    MultiAgent,
    /// Team-level coordination primitives.
    TeamCoordination,
    /// Talks the Model Context Protocol.
    McpProtocol,
    /// Anything outside the documented vocabulary.
    Other(String),
}

/// The catalog entry for one tool. Immutable after registration (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique name within the registry after conflict resolution.
    pub name: String,
    /// Semantic version of the tool.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// High-level category.
    pub category: ToolCategory,
    /// The adapter's identifier (e.g. `agno`, `fastmcp`).
    pub provider: String,
    /// JSON-Schema-shaped input description; only `properties`/`required`
    /// are inspected by the core (spec §9).
    pub input_schema: Value,
    /// JSON-Schema-shaped output description.
    pub output_schema: Value,
    /// Capability tags.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Default timeout in seconds.
    pub timeout: Option<u64>,
    /// Whether the tool supports async invocation.
    pub async_supported: bool,
    /// Whether the tool supports batched invocation.
    pub batch_supported: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-updated timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ToolSpec {
    /// Build a new spec with the given identity and schema; metadata and
    /// timestamps take defaults (`timeout` defaults to 30s, matching the
    /// source's `Optional[int] = 30`).
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
        category: ToolCategory,
        provider: impl Into<String>,
        input_schema: Value,
        output_schema: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
            category,
            provider: provider.into(),
            input_schema,
            output_schema,
            capabilities: Vec::new(),
            tags: Vec::new(),
            metadata: HashMap::new(),
            timeout: Some(30),
            async_supported: true,
            batch_supported: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach capability tags (builder-style, matching the teacher's
    /// fluent `Tool`/`Resource` construction idiom).
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Attach free-form tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// The required input keys, per the `properties`/`required` subset of
    /// `input_schema` the core actually inspects (spec §9).
    #[must_use]
    pub fn required_params(&self) -> Vec<String> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Validate a tool spec before it is allowed into an adapter's cache or the
/// registry's indices. Accumulates every violation rather than failing on
/// the first, matching `app/adapters/base_adapter.py::_validate_tool_spec`.
///
/// # Errors
///
/// Returns [`Error::InvalidToolSpec`] listing every violation found.
pub fn validate(spec: &ToolSpec) -> Result<(), Error> {
    let mut errors = Vec::new();

    if spec.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if spec.version.trim().is_empty() {
        errors.push("version is required".to_string());
    }
    if spec.input_schema.is_null() {
        errors.push("input_schema is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidToolSpec(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_params_reads_schema() {
        let spec = ToolSpec::new(
            "t",
            "1.0",
            "desc",
            ToolCategory::Custom,
            "demo",
            serde_json::json!({"properties": {"query": {"type": "string"}}, "required": ["query"]}),
            serde_json::json!({}),
        );
        assert_eq!(spec.required_params(), vec!["query".to_string()]);
    }

    #[test]
    fn validate_rejects_empty_name() {
        let spec = ToolSpec::new(
            "",
            "1.0",
            "desc",
            ToolCategory::Custom,
            "demo",
            serde_json::json!({}),
            serde_json::json!({}),
        );
        let err = validate(&spec).unwrap_err();
        assert_eq!(err.code(), "invalid_tool_spec");
    }
}
