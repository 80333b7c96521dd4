//! The stdio request loop and method routing

pub mod protocol;
pub mod tools;

use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::{Context, Result};
use rmcp::model::{CallToolResult, Content, ErrorData, ListToolsResult, ProtocolVersion};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::chart::ChartService;
use crate::config::ServerConfig;
use crate::engine::AstrologyEngine;
use crate::error::ChartError;
use crate::gazetteer::CoordinateResolver;
use crate::models::Outcome;

use protocol::{internal_error, method_not_found, parse_error, Request, Response};
use tools::{current_time, tool_catalog, ToolKind};

pub const SERVER_NAME: &str = "astrolabe-mcp-server";

const SERVER_DESCRIPTION: &str =
    "Astrolabe - astrology calculation server: natal charts, natal and synastry aspects, composite charts";

/// MCP server answering one JSON-RPC request per input line
pub struct AstrolabeServer<E> {
    charts: ChartService<E>,
}

impl<E: AstrologyEngine> AstrolabeServer<E> {
    pub fn new(charts: ChartService<E>) -> Self {
        Self { charts }
    }

    /// Wire an engine to the gazetteer and sandbox named by `config`
    pub fn from_config(engine: E, config: &ServerConfig) -> Self {
        let resolver = CoordinateResolver::from_file(config.gazetteer_path.clone());
        Self::new(ChartService::new(engine, resolver, config.sandbox.clone()))
    }

    /// Answer one input line; never fails and never panics
    pub fn handle_line(&self, line: &str) -> Response {
        let value: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request line");
                return Response::error(Value::Null, parse_error());
            }
        };

        let request = match Request::from_value(value) {
            Ok(r) => r,
            Err(e) => return Response::error(Value::Null, e),
        };

        tracing::debug!(method = ?request.method, id = %request.id, "request");

        respond(request.id.clone(), || self.dispatch(&request))
    }

    fn dispatch(&self, request: &Request) -> Result<Value, ErrorData> {
        match request.method.as_deref() {
            Some("initialize") => Ok(initialize_result()),
            Some("tools/list") => {
                let result = ListToolsResult {
                    tools: tool_catalog(),
                    next_cursor: None,
                    meta: None,
                };
                serde_json::to_value(result).map_err(internal_error)
            }
            Some("tools/call") => {
                serde_json::to_value(self.call_tool(&request.params)).map_err(internal_error)
            }
            _ => Err(method_not_found()),
        }
    }

    fn call_tool(&self, params: &Value) -> CallToolResult {
        let raw_name = params.get("name").unwrap_or(&Value::Null);
        let Some(kind) = raw_name.as_str().and_then(ToolKind::from_name) else {
            let shown = match raw_name {
                Value::String(name) => name.clone(),
                other => other.to_string(),
            };
            tracing::warn!(tool = %shown, "unknown tool");
            return CallToolResult::error(vec![Content::text(format!("Unknown tool: {}", shown))]);
        };
        let name = kind.name();

        tracing::info!(tool = name, "tool call");

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let person = |key: &str| arguments.get(key).cloned().unwrap_or(Value::Null);

        let outcome = match kind {
            ToolKind::CurrentTime => current_time(),
            ToolKind::Subject => self.charts.create_subject(&arguments),
            ToolKind::NatalAspects => self.charts.natal_aspects(&arguments),
            ToolKind::SynastryAspects => self
                .charts
                .synastry_aspects(&person("person1_data"), &person("person2_data")),
            ToolKind::CompositeChart => self
                .charts
                .composite_chart(&person("person1_data"), &person("person2_data")),
        };

        tool_result(&outcome)
    }

    /// Serve requests until `reader` is exhausted
    ///
    /// Every line gets exactly one response line, flushed before the next read.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("failed to read request")?;
            if read == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            let response = self.handle_line(&line);

            let mut out = serde_json::to_string(&response).context("failed to encode response")?;
            out.push('\n');
            writer
                .write_all(out.as_bytes())
                .await
                .context("failed to write response")?;
            writer.flush().await.context("failed to flush response")?;
        }
        tracing::info!("input closed");
        Ok(())
    }
}

/// Run one dispatch; its error or panic becomes the JSON-RPC error for `id`
fn respond(id: Value, dispatch: impl FnOnce() -> Result<Value, ErrorData>) -> Response {
    match catch_unwind(AssertUnwindSafe(dispatch)) {
        Ok(Ok(result)) => Response::result(id, result),
        Ok(Err(error)) => Response::error(id, error),
        Err(payload) => {
            let e = ChartError::from_panic(payload);
            tracing::error!(error = %e, "request handler panicked");
            Response::error(id, internal_error(e))
        }
    }
}

/// Wrap an outcome as tool output: pretty JSON text, `isError` when it failed
fn tool_result(outcome: &Outcome) -> CallToolResult {
    render_tool_output(serde_json::to_string_pretty(outcome), outcome.success)
}

fn render_tool_output(rendered: serde_json::Result<String>, success: bool) -> CallToolResult {
    match rendered {
        Ok(text) if success => CallToolResult::success(vec![Content::text(text)]),
        Ok(text) => CallToolResult::error(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(format!("Tool call error: {}", e))]),
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": ProtocolVersion::V_2024_11_05,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "description": SERVER_DESCRIPTION,
        },
    })
}
