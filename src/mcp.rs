// SeaTable MCP Gateway - MCP Server (JSON-RPC 2.0 over stdio)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Line-delimited JSON-RPC on stdin/stdout. stdout carries protocol frames
// only; all logging goes to stderr.
// Exposes: list_rows, add_row, update_row, delete_row, get_base_info,
//          run_sql, list/insert/delete_column, add_select_options,
//          list/create/delete_view, create/rename/delete_table,
//          get_server_info, list_bases

use crate::seatable::Connector;
use crate::tools::{tool_definitions, ToolHost};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "seatable-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const SUMMARY_MAX: usize = 300;

/// Summarize tool args for logging. Tokens never reach the log.
fn param_summary(args: &Value) -> String {
    let mut shown = args.clone();
    if let Some(obj) = shown.as_object_mut() {
        if obj.contains_key("api_token") {
            obj.insert("api_token".to_string(), json!("<redacted>"));
        }
    }
    let s = shown.to_string();
    if s.chars().count() > SUMMARY_MAX {
        let head: String = s.chars().take(SUMMARY_MAX).collect();
        format!("{}…", head)
    } else {
        s
    }
}

fn response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn error_response(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Write one frame + newline and flush.
fn send<W: Write>(out: &mut W, msg: &Value) -> io::Result<()> {
    let line = serde_json::to_string(msg)?;
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

pub struct McpServer<C: Connector> {
    host: ToolHost<C>,
}

impl<C: Connector> McpServer<C> {
    pub fn new(host: ToolHost<C>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &ToolHost<C> {
        &self.host
    }

    /// Reply for one decoded message, or `None` for notifications and
    /// messages that get no answer.
    pub fn handle_message(&self, msg: &Value) -> Option<Value> {
        let method = msg["method"].as_str().unwrap_or("");
        let id = &msg["id"];
        let params = &msg["params"];

        log::debug!("Received: {}", method);

        match method {
            "initialize" => Some(response(id, json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION,
                }
            }))),

            "notifications/initialized" => None,

            "tools/list" => Some(response(id, json!({ "tools": tool_definitions() }))),

            "tools/call" => {
                let name = params["name"].as_str().unwrap_or("");
                let args = params.get("arguments").cloned().unwrap_or(json!({}));

                log::info!("CALL {} | {}", name, param_summary(&args));
                let output = self.host.call(name, &args);
                if output.is_error {
                    let snippet: String = output.text.chars().take(200).collect();
                    log::info!("FAIL {} | {}", name, snippet);
                }

                Some(response(id, json!({
                    "content": [{ "type": "text", "text": output.text }],
                    "isError": output.is_error,
                })))
            }

            "ping" => Some(response(id, json!({}))),

            _ => {
                if id.is_null() {
                    None
                } else {
                    Some(error_response(id, -32601, &format!("Unknown method: {}", method)))
                }
            }
        }
    }

    /// Decode and handle one input line. Blank or unparsable lines are
    /// skipped.
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(msg) => self.handle_message(&msg),
            Err(e) => {
                log::warn!("JSON parse error: {}", e);
                None
            }
        }
    }

    /// Serve until `input` hits EOF.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::warn!("stdin read error: {}", e);
                    continue;
                }
            };
            if let Some(reply) = self.handle_line(&line) {
                send(&mut output, &reply)?;
            }
        }
        Ok(())
    }
}

/// Main MCP server loop on stdio. Returns when stdin closes.
pub fn run<C: Connector>(server: &McpServer<C>) -> io::Result<()> {
    log::info!("Starting {} v{}", SERVER_NAME, SERVER_VERSION);
    log::info!(
        "Server: {} | Config: {}",
        server.host().cache().server_url(),
        server.host().config().describe()
    );
    let stdin = io::stdin();
    let stdout = io::stdout();
    server.serve(stdin.lock(), stdout.lock())
}

// ============================================================================
// TESTS
// ============================================================================
