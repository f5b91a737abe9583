//! Tool abstraction for agent function-calling.
//!
//! The [`Tool`] trait defines the interface every tool implements: a static
//! API definition (name, description, JSON schema) and an async `execute`
//! method. Tools are collected into a [`ToolSet`] which handles dispatch,
//! argument validation, timeouts, and result truncation.
//!
//! Tool results are always strings. Success is JSON; failure is
//! `Error [<kind>]: <message>` so the caller can branch on the kind code.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::ToolDef;
use crate::error::{FsError, Result};

/// Maximum size (in bytes) for tool output before truncation.
pub const DEFAULT_MAX_RESULT_BYTES: usize = 30_000;

/// Default timeout for tool execution (60 seconds).
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = String> + Send + 'a>>;

// ── Tool trait ─────────────────────────────────────────────────────

/// A tool that an agent can invoke via function-calling.
///
/// Implementors provide:
/// - A static definition ([`Tool::definition`]) describing the tool's name,
///   description, and JSON Schema parameters.
/// - An async [`Tool::execute`] method that receives the raw JSON arguments
///   string and returns a result string.
///
/// Errors are returned as `"Error [kind]: ..."` strings rather than
/// panicking; the caller passes the string back to the agent as the tool
/// result regardless.
pub trait Tool: Send + Sync {
    /// The tool definition sent to the agent.
    fn definition(&self) -> ToolDef;

    /// Execute the tool with the given raw JSON arguments string.
    ///
    /// Uses a boxed future so that the trait is dyn-compatible.
    fn execute(&self, arguments: &str) -> ToolFuture<'_>;

    /// The tool's name (convenience, delegates to definition).
    fn name(&self) -> String {
        self.definition().function.name.clone()
    }

    /// Whether this tool changes the filesystem. Mutation tools are swapped
    /// for [`DisabledTool`]s in read-only sessions, and their effects are
    /// not visible to index queries until the next refresh.
    fn is_mutation(&self) -> bool {
        false
    }
}

// ── ToolSet ────────────────────────────────────────────────────────

/// A collection of tools that can be dispatched by name.
///
/// # Example
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with_max_result_bytes(15_000)
///     .with_arg_validation(true)
///     .with_default_timeout(Some(Duration::from_secs(30)))
///     .with_fs_tools(&session, &config);
///
/// let result = tools.execute("search_file_by_name", r#"{"name": "report"}"#).await;
/// ```
pub struct ToolSet {
    tools: HashMap<String, Box<dyn Tool>>,
    max_result_bytes: usize,
    /// Whether to validate tool arguments against JSON Schema before execution.
    validate_args: bool,
    /// Timeout for tool execution. `None` disables timeouts.
    default_timeout: Option<Duration>,
    mutation_tools: HashSet<String>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .field("max_result_bytes", &self.max_result_bytes)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            max_result_bytes: DEFAULT_MAX_RESULT_BYTES,
            validate_args: false,
            default_timeout: None,
            mutation_tools: HashSet::new(),
        }
    }

    /// Set the maximum result size in bytes before truncation.
    pub fn with_max_result_bytes(mut self, max: usize) -> Self {
        self.max_result_bytes = max;
        self
    }

    /// Enable JSON Schema argument validation before tool execution.
    pub fn with_arg_validation(mut self, enabled: bool) -> Self {
        self.validate_args = enabled;
        self
    }

    /// Set a timeout for tool execution. Pass `None` to disable timeouts.
    ///
    /// On timeout the tool's future is dropped. Long-running tools tie a
    /// cancellation token to that drop so their blocking work stops too.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name();
        if tool.is_mutation() {
            self.mutation_tools.insert(name.clone());
        } else {
            self.mutation_tools.remove(&name);
        }
        self.tools.insert(name, Box::new(tool));
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// Conditionally register a tool (builder pattern).
    pub fn with_if(self, condition: bool, tool: impl Tool + 'static) -> Self {
        if condition { self.with(tool) } else { self }
    }

    /// All tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDef> {
        let mut defs: Vec<ToolDef> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.tools.contains_key(tool_name)
    }

    /// Whether a tool changes the filesystem.
    pub fn is_mutation_tool(&self, tool_name: &str) -> bool {
        self.mutation_tools.contains(tool_name)
    }

    pub fn max_result_bytes(&self) -> usize {
        self.max_result_bytes
    }

    /// Execute a tool call by name, with optional validation, timing, and
    /// truncation.
    ///
    /// Returns the (possibly truncated) result string, or an error string if
    /// the tool is unknown, the arguments are invalid, or the call timed out.
    pub async fn execute(&self, name: &str, arguments: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            return format!(
                "Error [unknown_tool]: unknown tool '{name}'. Available tools: {}",
                self.names().join(", ")
            );
        };

        if self.validate_args
            && let Some(error) = validate_tool_arguments(tool.as_ref(), arguments)
        {
            return error;
        }

        log_tool_call(name, arguments);
        let start = std::time::Instant::now();

        let result = if let Some(timeout_duration) = self.default_timeout {
            match tokio::time::timeout(timeout_duration, tool.execute(arguments)).await {
                Ok(r) => r,
                Err(_) => {
                    info!(
                        "Tool {name} timed out after {:.1}s (limit: {:.0}s)",
                        start.elapsed().as_secs_f64(),
                        timeout_duration.as_secs_f64(),
                    );
                    format!(
                        "{}. Try narrower arguments, for example a single subfolder.",
                        FsError::TimedOut(timeout_duration).to_tool_error()
                    )
                }
            }
        } else {
            tool.execute(arguments).await
        };

        debug!(
            "Tool {name} completed in {:.0}ms ({} bytes)",
            start.elapsed().as_secs_f64() * 1000.0,
            result.len()
        );
        trace!(
            "Tool {name} result preview: {}",
            result.chars().take(300).collect::<String>()
        );

        truncate_result(result, self.max_result_bytes)
    }

    /// Execute several `(name, arguments)` calls, returning results in call
    /// order.
    ///
    /// Consecutive non-mutation calls run concurrently. Each mutation call
    /// runs alone, after everything before it has finished and before
    /// anything after it starts.
    pub async fn execute_batch(&self, calls: &[(&str, &str)]) -> Vec<String> {
        let mut results = Vec::with_capacity(calls.len());
        let mut start = 0;
        while start < calls.len() {
            let (name, arguments) = calls[start];
            if self.is_mutation_tool(name) {
                results.push(self.execute(name, arguments).await);
                start += 1;
                continue;
            }
            let end = calls[start..]
                .iter()
                .position(|(name, _)| self.is_mutation_tool(name))
                .map_or(calls.len(), |offset| start + offset);
            if end - start > 1 {
                debug!("Running {} read-only tool calls concurrently", end - start);
            }
            let wave = calls[start..end]
                .iter()
                .map(|(name, arguments)| self.execute(name, arguments));
            results.extend(futures::future::join_all(wave).await);
            start = end;
        }
        results
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── DisabledTool ───────────────────────────────────────────────────

/// A tool that always returns an error message when executed.
///
/// The agent still sees the tool's name, description, and schema, but every
/// call returns `Error [disabled]: {reason}`. Read-only sessions register
/// the mutation tools this way.
pub struct DisabledTool {
    def: ToolDef,
    reason: String,
}

impl DisabledTool {
    pub fn new(def: ToolDef, reason: impl Into<String>) -> Self {
        Self {
            def,
            reason: reason.into(),
        }
    }

    /// Create a disabled variant of an existing tool, keeping its definition.
    pub fn from_tool(tool: &dyn Tool, reason: impl Into<String>) -> Self {
        Self::new(tool.definition(), reason)
    }
}

impl Tool for DisabledTool {
    fn definition(&self) -> ToolDef {
        self.def.clone()
    }

    fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
        let msg = format!("Error [disabled]: {}", self.reason);
        Box::pin(async move { msg })
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Validate tool arguments against the tool's declared JSON Schema.
///
/// Returns `None` if valid, or `Some(error_string)` if validation fails.
pub fn validate_tool_arguments(tool: &dyn Tool, arguments: &str) -> Option<String> {
    let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };
    let args_value: serde_json::Value = match serde_json::from_str(arguments) {
        Ok(v) => v,
        Err(e) => {
            return Some(format!(
                "Error [invalid_argument]: invalid JSON arguments for tool '{}': {e}. \
                 Please provide valid JSON matching the tool's parameter schema.",
                tool.name()
            ));
        }
    };

    let schema = tool.definition().function.parameters;

    // An invalid schema is a programming error in the tool; skip validation.
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(_) => return None,
    };

    let errors: Vec<String> = validator
        .iter_errors(&args_value)
        .map(|e| format!("  - {}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(format!(
            "Error [invalid_argument]: argument validation failed for tool '{}':\n{}\n\
             Please fix the arguments and try again.",
            tool.name(),
            errors.join("\n")
        ))
    }
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(name: &str, arguments: &str) {
    let args_preview: String = arguments.chars().take(120).collect();
    info!(
        "[tool] {}({args_preview}{})",
        name,
        if arguments.chars().count() > 120 { "..." } else { "" }
    );
    trace!("[tool] {name} arguments: {arguments}");
}

/// Truncate a string to at most `max` bytes, appending a notice if trimmed.
///
/// The cut moves back to the nearest character boundary.
pub fn truncate_result(mut s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let total = s.len();
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s.push_str(&format!("...\n[truncated: {total} bytes total]"));
    s
}

/// Parse raw JSON arguments into a typed struct.
///
/// Returns a formatted error string suitable for returning directly from
/// [`Tool::execute`].
pub fn parse_tool_args<T: serde::de::DeserializeOwned>(arguments: &str) -> Result<T, String> {
    // Tools without parameters may be called with an empty string.
    let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(arguments).map_err(|e| {
        format!(
            "Error [invalid_argument]: invalid tool arguments: {e}. \
             Please provide valid JSON matching the tool's parameter schema."
        )
    })
}

/// Render an operation result as a tool result string.
pub fn render<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|e| {
            FsError::InvalidArgument(format!("result is not serializable: {e}")).to_tool_error()
        }),
        Err(err) => err.to_tool_error(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    impl Tool for EchoTool {
        fn definition(&self) -> ToolDef {
            ToolDef::new(
                "echo",
                "Echo the input",
                serde_json::json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            )
        }

        fn execute(&self, arguments: &str) -> ToolFuture<'_> {
            let result = match parse_tool_args::<serde_json::Value>(arguments) {
                Ok(v) => v["text"].as_str().unwrap_or("").to_string(),
                Err(e) => e,
            };
            Box::pin(async move { result })
        }
    }

    struct SlowTool;

    impl Tool for SlowTool {
        fn definition(&self) -> ToolDef {
            ToolDef::new(
                "slow",
                "Sleeps",
                serde_json::json!({"type": "object", "properties": {}}),
            )
        }

        fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done".to_string()
            })
        }

        fn is_mutation(&self) -> bool {
            true
        }
    }

    #[test]
    fn tool_name_from_definition() {
        assert_eq!(EchoTool.name(), "echo");
    }

    #[test]
    fn definitions_are_sorted() {
        let set = ToolSet::new().with(SlowTool).with(EchoTool);
        let names: Vec<String> = set
            .definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(names, vec!["echo", "slow"]);
        assert!(set.is_mutation_tool("slow"));
        assert!(!set.is_mutation_tool("echo"));
    }

    #[tokio::test]
    async fn execute_known_tool() {
        let set = ToolSet::new().with(EchoTool);
        assert_eq!(set.execute("echo", r#"{"text": "hello"}"#).await, "hello");
    }

    #[tokio::test]
    async fn execute_unknown_tool() {
        let set = ToolSet::new().with(EchoTool);
        let result = set.execute("nonexistent", "{}").await;
        assert!(result.starts_with("Error [unknown_tool]"));
        assert!(result.contains("echo"));
    }

    #[tokio::test]
    async fn validation_rejects_missing_field() {
        let set = ToolSet::new().with_arg_validation(true).with(EchoTool);
        let result = set.execute("echo", "{}").await;
        assert!(result.starts_with("Error [invalid_argument]"));
        assert!(result.contains("text"));
    }

    #[tokio::test]
    async fn validation_rejects_malformed_json() {
        let set = ToolSet::new().with_arg_validation(true).with(EchoTool);
        let result = set.execute("echo", "{not json").await;
        assert!(result.starts_with("Error [invalid_argument]"));
    }

    #[tokio::test]
    async fn timeout_returns_timed_out() {
        let set = ToolSet::new()
            .with_default_timeout(Some(Duration::from_millis(50)))
            .with(SlowTool);
        let result = set.execute("slow", "{}").await;
        assert!(result.starts_with("Error [timed_out]"), "{result}");
    }

    struct Counter {
        name: &'static str,
        count: std::sync::Arc<std::sync::atomic::AtomicUsize>,
        bump: bool,
    }

    impl Tool for Counter {
        fn definition(&self) -> ToolDef {
            ToolDef::new(self.name, "Counts", serde_json::json!({"type": "object"}))
        }

        fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
            use std::sync::atomic::Ordering;
            Box::pin(async move {
                if self.bump {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    self.count.fetch_add(1, Ordering::SeqCst);
                }
                self.count.load(Ordering::SeqCst).to_string()
            })
        }

        fn is_mutation(&self) -> bool {
            self.bump
        }
    }

    #[tokio::test]
    async fn batch_orders_around_mutations() {
        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let set = ToolSet::new()
            .with(Counter {
                name: "peek",
                count: count.clone(),
                bump: false,
            })
            .with(Counter {
                name: "bump",
                count,
                bump: true,
            });
        let results = set
            .execute_batch(&[("peek", ""), ("peek", ""), ("bump", ""), ("peek", ""), ("nope", "")])
            .await;
        assert_eq!(results[..4], ["0", "0", "1", "1"]);
        assert!(results[4].starts_with("Error [unknown_tool]"));
    }

    #[tokio::test]
    async fn disabled_tool_keeps_definition() {
        let disabled = DisabledTool::from_tool(&EchoTool, "read-only session");
        assert_eq!(disabled.name(), "echo");
        assert!(!disabled.is_mutation());
        let result = disabled.execute(r#"{"text": "hi"}"#).await;
        assert_eq!(result, "Error [disabled]: read-only session");
    }

    #[test]
    fn truncate_short_unchanged() {
        assert_eq!(truncate_result("hello".into(), 100), "hello");
    }

    #[test]
    fn truncate_long_is_cut() {
        let result = truncate_result("a".repeat(200), 50);
        assert!(result.starts_with(&"a".repeat(50)));
        assert!(result.contains("[truncated: 200 bytes total]"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // Each 'é' is two bytes; a cut at 5 must back off to 4.
        let result = truncate_result("ééééé".into(), 5);
        assert!(result.starts_with("éé..."));
    }

    #[test]
    fn render_formats_errors_with_kind() {
        let err: Result<()> = Err(FsError::Cancelled);
        assert_eq!(render(err), "Error [cancelled]: operation cancelled");
        assert_eq!(render(Ok(serde_json::json!({"a": 1}))), r#"{"a":1}"#);
    }

    #[test]
    fn empty_arguments_parse_as_empty_object() {
        let parsed: serde_json::Value = parse_tool_args("").unwrap();
        assert!(parsed.as_object().unwrap().is_empty());
    }
}
