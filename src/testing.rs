// SeaTable MCP Gateway - Test Doubles
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// In-memory Connector/BaseApi. Counts handshakes per token, records every
// base call, and can be told to fail or answer specific methods.

use crate::column::ColumnType;
use crate::error::{SeaTableError, SeaTableResult};
use crate::seatable::{BaseApi, Connector};
use crate::token::ApiToken;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub token: String,
    pub method: &'static str,
    pub args: Value,
}

#[derive(Default)]
struct MockState {
    auths: Mutex<HashMap<String, usize>>,
    rejected: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, String>>,
    responses: Mutex<HashMap<&'static str, Value>>,
}

pub struct MockConnector {
    state: Arc<MockState>,
    delay: Option<Duration>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self { state: Arc::new(MockState::default()), delay: None }
    }

    /// Handshake sleeps a little, to widen race windows.
    pub fn slow() -> Self {
        Self { delay: Some(Duration::from_millis(20)), ..Self::new() }
    }

    pub fn reject(&self, token: &str) {
        self.state.rejected.lock().unwrap().insert(token.to_string());
    }

    pub fn accept(&self, token: &str) {
        self.state.rejected.lock().unwrap().remove(token);
    }

    pub fn auth_count(&self, token: &str) -> usize {
        self.state.auths.lock().unwrap().get(token).copied().unwrap_or(0)
    }

    pub fn total_auths(&self) -> usize {
        self.state.auths.lock().unwrap().values().sum()
    }

    /// Make `method` fail with a remote error carrying `msg`.
    pub fn fail(&self, method: &'static str, msg: &str) {
        self.state.failures.lock().unwrap().insert(method, msg.to_string());
    }

    /// Make `method` return `value` instead of its default.
    pub fn respond(&self, method: &'static str, value: Value) {
        self.state.responses.lock().unwrap().insert(method, value);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self, method: &str) -> Option<Call> {
        self.calls().into_iter().rev().find(|c| c.method == method)
    }
}

impl Connector for MockConnector {
    type Conn = MockBase;

    fn connect(&self, token: &ApiToken, server_url: &str) -> SeaTableResult<MockBase> {
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        let raw = token.expose().to_string();
        *self.state.auths.lock().unwrap().entry(raw.clone()).or_insert(0) += 1;
        if self.state.rejected.lock().unwrap().contains(&raw) {
            return Err(SeaTableError::AuthenticationFailed("invalid api token".to_string()));
        }
        Ok(MockBase {
            token: raw,
            server_url: server_url.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockBase {
    pub token: String,
    pub server_url: String,
    state: Arc<MockState>,
}

impl MockBase {
    fn record(&self, method: &'static str, args: Value) -> SeaTableResult<Value> {
        self.state.calls.lock().unwrap().push(Call {
            token: self.token.clone(),
            method,
            args,
        });
        if let Some(msg) = self.state.failures.lock().unwrap().get(method) {
            return Err(SeaTableError::remote(msg.clone()));
        }
        Ok(self
            .state
            .responses
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| json!({ "success": true })))
    }
}

impl BaseApi for MockBase {
    fn dtable_name(&self) -> Option<&str> {
        Some("Mock Base")
    }

    fn list_rows(&self, table: &str, view: Option<&str>, limit: u32) -> SeaTableResult<Value> {
        self.record("list_rows", json!({ "table": table, "view": view, "limit": limit }))
    }

    fn append_row(&self, table: &str, row: &Value) -> SeaTableResult<Value> {
        self.record("append_row", json!({ "table": table, "row": row }))
    }

    fn update_row(&self, table: &str, row_id: &str, row: &Value) -> SeaTableResult<()> {
        self.record("update_row", json!({ "table": table, "row_id": row_id, "row": row }))
            .map(|_| ())
    }

    fn delete_row(&self, table: &str, row_id: &str) -> SeaTableResult<()> {
        self.record("delete_row", json!({ "table": table, "row_id": row_id })).map(|_| ())
    }

    fn get_metadata(&self) -> SeaTableResult<Value> {
        self.record("get_metadata", json!({}))
    }

    fn query(&self, sql: &str) -> SeaTableResult<Value> {
        self.record("query", json!({ "sql": sql }))
    }

    fn list_columns(&self, table: &str, view: Option<&str>) -> SeaTableResult<Value> {
        self.record("list_columns", json!({ "table": table, "view": view }))
    }

    fn insert_column(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        data: Option<&Value>,
    ) -> SeaTableResult<Value> {
        self.record(
            "insert_column",
            json!({ "table": table, "column": column, "type": column_type.code(), "data": data }),
        )
    }

    fn delete_column(&self, table: &str, column: &str) -> SeaTableResult<()> {
        self.record("delete_column", json!({ "table": table, "column": column })).map(|_| ())
    }

    fn add_column_options(&self, table: &str, column: &str, options: &[Value]) -> SeaTableResult<()> {
        self.record(
            "add_column_options",
            json!({ "table": table, "column": column, "options": options }),
        )
        .map(|_| ())
    }

    fn list_views(&self, table: &str) -> SeaTableResult<Value> {
        self.record("list_views", json!({ "table": table }))
    }

    fn add_view(&self, table: &str, view: &str, view_type: &str) -> SeaTableResult<Value> {
        self.record("add_view", json!({ "table": table, "view": view, "type": view_type }))
    }

    fn delete_view(&self, table: &str, view: &str) -> SeaTableResult<()> {
        self.record("delete_view", json!({ "table": table, "view": view })).map(|_| ())
    }

    fn add_table(&self, table: &str) -> SeaTableResult<Value> {
        self.record("add_table", json!({ "table": table }))
    }

    fn rename_table(&self, table: &str, new_name: &str) -> SeaTableResult<()> {
        self.record("rename_table", json!({ "table": table, "new_name": new_name })).map(|_| ())
    }

    fn delete_table(&self, table: &str) -> SeaTableResult<()> {
        self.record("delete_table", json!({ "table": table })).map(|_| ())
    }
}
