//! MCP (Model Context Protocol) Server
//!
//! This module implements an MCP server using manual JSON-RPC 2.0 over stdio.
//!
//! # Architecture
//!
//! - **Transport**: JSON-RPC 2.0 over stdio (line-based)
//! - **Protocol**: `initialize`, `tools/list`, `tools/call`
//! - **Schemas**: tool input schemas are generated from the argument structs with `schemars`
//!
//! # MCP Tools
//!
//! - `rewrite` - Convert a `:name` template into `?` form plus the parameter list
//! - `bind` - Rewrite, then resolve every parameter from a JSON object
//!
//! Every tool call reloads settings from disk, so each invocation is independent.
//!
//! # Usage
//!
//! Start the MCP server with: `namedsql mcp`

use anyhow::{anyhow, Result};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::config::{load_settings, Settings};

// ============================================================================
// JSON-RPC 2.0 Structures
// ============================================================================

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn result(id: Option<Value>, value: Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(value), error: None }
    }

    fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message, data: None }),
        }
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

const PARSE_ERROR: i32 = -32700;
const INTERNAL_ERROR: i32 = -32603;

// ============================================================================
// MCP Tool Structures
// ============================================================================

/// Text content block for MCP tool results
#[derive(Debug, Serialize)]
struct TextContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

/// MCP tool call result
#[derive(Debug, Serialize)]
struct CallToolResult {
    content: Vec<TextContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

impl CallToolResult {
    /// Create a successful tool result with JSON data
    fn success(data: impl Serialize) -> Result<Value> {
        let text = serde_json::to_string_pretty(&data)?;
        let result = Self {
            content: vec![TextContent { content_type: "text".to_string(), text }],
            is_error: false,
        };
        Ok(serde_json::to_value(result)?)
    }
}

/// Arguments of the `rewrite` tool
#[derive(Debug, Deserialize, JsonSchema)]
struct RewriteArgs {
    /// SQL template using :name placeholders
    sql: String,

    /// Treat -- and /* */ comments as opaque (overrides config)
    #[serde(default)]
    skip_comments: Option<bool>,

    /// Backslash escapes the next character inside string literals (overrides config)
    #[serde(default)]
    backslash_escapes: Option<bool>,
}

/// Arguments of the `bind` tool
#[derive(Debug, Deserialize, JsonSchema)]
struct BindArgs {
    /// SQL template using :name placeholders
    sql: String,

    /// Values keyed by parameter name, without the leading colon
    params: Map<String, Value>,

    /// Treat -- and /* */ comments as opaque (overrides config)
    #[serde(default)]
    skip_comments: Option<bool>,

    /// Backslash escapes the next character inside string literals (overrides config)
    #[serde(default)]
    backslash_escapes: Option<bool>,
}

// ============================================================================
// MCP Server
// ============================================================================

/// Start the MCP server
///
/// Reads one JSON-RPC request per line from stdin and writes one response per
/// line to stdout until stdin closes.
///
/// # Errors
///
/// Returns an error if stdio communication fails.
pub async fn serve() -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_message(&line)?;
        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    debug!("stdin closed, stopping MCP server");
    Ok(())
}

/// Handle one line of input and produce the serialized response
///
/// # Errors
///
/// Fails only if the response itself cannot be serialized.
pub fn handle_message(line: &str) -> Result<String> {
    let response = match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(request) => handle_request(request),
        Err(e) => {
            warn!("unparseable JSON-RPC request: {e}");
            JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}"))
        }
    };

    Ok(serde_json::to_string(&response)?)
}

/// Route a request to its handler
fn handle_request(request: JsonRpcRequest) -> JsonRpcResponse {
    let result = match request.method.as_str() {
        "initialize" => handle_initialize(),
        "tools/list" => handle_list_tools(),
        "tools/call" => handle_call_tool(request.params),
        _ => Err(anyhow!("Unknown method: {}", request.method)),
    };

    match result {
        Ok(value) => JsonRpcResponse::result(request.id, value),
        Err(e) => JsonRpcResponse::error(request.id, INTERNAL_ERROR, e.to_string()),
    }
}

// ============================================================================
// MCP Protocol Handlers
// ============================================================================

/// Handle MCP initialize request
fn handle_initialize() -> Result<Value> {
    Ok(serde_json::json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": "namedsql",
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Handle tools/list request
fn handle_list_tools() -> Result<Value> {
    Ok(serde_json::json!({
        "tools": [
            {
                "name": "rewrite",
                "description": "Convert a SQL template with :name placeholders into positional ? form. Returns the rewritten query and the parameter names in binding order; a name used twice appears twice. Colons inside quoted literals, clock times such as 10:30, and :: casts are left alone.",
                "inputSchema": schema_for!(RewriteArgs)
            },
            {
                "name": "bind",
                "description": "Rewrite a SQL template and resolve every :name placeholder from the params object. Returns the rewritten query, the parameter names and one value per ? in order. Fails listing every name that has no value.",
                "inputSchema": schema_for!(BindArgs)
            }
        ]
    }))
}

/// Handle tools/call request
fn handle_call_tool(params: Option<Value>) -> Result<Value> {
    let params = params.ok_or_else(|| anyhow!("Missing params"))?;
    let name = params["name"].as_str().ok_or_else(|| anyhow!("Missing tool name"))?;
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match name {
        "rewrite" => tool_rewrite(serde_json::from_value(arguments)?),
        "bind" => tool_bind(serde_json::from_value(arguments)?),
        _ => Err(anyhow!("Unknown tool: {name}")),
    }
}

// ============================================================================
// Tool Implementations
// ============================================================================

/// Load settings and apply per-call overrides
fn settings_with(skip_comments: Option<bool>, backslash_escapes: Option<bool>) -> Result<Settings> {
    let mut settings = load_settings().map_err(|e| anyhow!("{e}"))?;
    if let Some(skip_comments) = skip_comments {
        settings.rewrite.skip_comments = skip_comments;
    }
    if let Some(backslash_escapes) = backslash_escapes {
        settings.rewrite.backslash_escapes = backslash_escapes;
    }
    Ok(settings)
}

/// MCP Tool: rewrite
fn tool_rewrite(args: RewriteArgs) -> Result<Value> {
    let settings = settings_with(args.skip_comments, args.backslash_escapes)?;
    let rewritten = settings.rewrite(&args.sql).map_err(|e| anyhow!("{e}"))?;
    CallToolResult::success(rewritten)
}

/// MCP Tool: bind
fn tool_bind(args: BindArgs) -> Result<Value> {
    let settings = settings_with(args.skip_comments, args.backslash_escapes)?;
    let bound = settings.bind(&args.sql, &args.params).map_err(|e| anyhow!("{e}"))?;
    CallToolResult::success(bound)
}
