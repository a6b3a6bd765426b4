//! Error types for the tool registry platform

use thiserror::Error;

/// Result type alias for the platform
pub type Result<T> = std::result::Result<T, Error>;

/// Platform errors.
///
/// Adapter-level failures are always trapped by the adapter itself and
/// surfaced as a failed [`crate::result::ToolResult`], never as this type.
/// The variants here are the structural errors that bubble up to the
/// Registry/Manager/Bridge boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Operation attempted before the Registry/Manager was ready.
    #[error("not initialized")]
    NotInitialized,

    /// Two adapters registered under the same provider name.
    #[error("adapter already registered: {0}")]
    DuplicateAdapter(String),

    /// The same provider re-registered a tool it already owns.
    #[error("tool {tool} already registered by provider {provider}")]
    DuplicateTool {
        /// Tool name
        tool: String,
        /// Provider name
        provider: String,
    },

    /// Tool name absent from the global index.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Spec's provider has no live adapter registered.
    #[error("adapter not found for provider: {0}")]
    AdapterNotFound(String),

    /// Required parameter keys missing.
    #[error("invalid params: missing {0:?}")]
    InvalidParams(Vec<String>),

    /// Tool spec failed validation.
    #[error("invalid tool spec: {0:?}")]
    InvalidToolSpec(Vec<String>),

    /// Adapter-level execution failure.
    #[error("execution error: {0}")]
    ExecutionError(String),

    /// Wall-clock bound exceeded.
    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Caller or shutdown cancelled the request.
    #[error("cancelled")]
    Cancelled,

    /// Fatal adapter initialization failure.
    #[error("init error: {0}")]
    InitError(String),

    /// Adapter initialization exceeded the configured deadline.
    #[error("init timeout after {0:?}")]
    InitTimeout(std::time::Duration),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The stable error-code string surfaced to API callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::DuplicateAdapter(_) => "duplicate_adapter",
            Self::DuplicateTool { .. } => "duplicate_tool",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::AdapterNotFound(_) => "adapter_not_found",
            Self::InvalidParams(_) => "invalid_params",
            Self::InvalidToolSpec(_) => "invalid_tool_spec",
            Self::ExecutionError(_) => "execution_error",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::InitError(_) => "init_error",
            Self::InitTimeout(_) => "init_timeout",
            Self::Config(_) => "config_error",
            Self::Json(_) => "json_error",
            Self::Io(_) => "io_error",
        }
    }

    /// HTTP status code this error maps to at the API Bridge boundary.
    /// Structural errors get a non-200 status; a failed `ToolResult` never
    /// does.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ToolNotFound(_) => 404,
            Self::InvalidParams(_) | Self::InvalidToolSpec(_) => 422,
            Self::AdapterNotFound(_) | Self::NotInitialized => 503,
            _ => 500,
        }
    }
}
