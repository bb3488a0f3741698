// SeaTable MCP Gateway - SeaTable API Client
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Remote surface of one SeaTable base (BaseApi) and the handshake that
// produces it (Connector). HTTP implementation talks to the API gateway:
//   auth:  GET  {server}/api/v2.1/dtable/app-access-token/   (API token)
//   data:  {server}/api-gateway/api/v2/dtables/{uuid}/...    (access token)

use crate::column::ColumnType;
use crate::error::{SeaTableError, SeaTableResult};
use crate::token::ApiToken;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::AUTHORIZATION;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!("seatable-mcp/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BODY_MAX: usize = 300;

/// Operations on one authenticated base. Results are raw API JSON.
pub trait BaseApi: Send + Sync {
    /// Base name reported by the server at auth time, if any.
    fn dtable_name(&self) -> Option<&str>;

    fn list_rows(&self, table: &str, view: Option<&str>, limit: u32) -> SeaTableResult<Value>;
    fn append_row(&self, table: &str, row: &Value) -> SeaTableResult<Value>;
    fn update_row(&self, table: &str, row_id: &str, row: &Value) -> SeaTableResult<()>;
    fn delete_row(&self, table: &str, row_id: &str) -> SeaTableResult<()>;

    fn get_metadata(&self) -> SeaTableResult<Value>;
    fn query(&self, sql: &str) -> SeaTableResult<Value>;

    fn list_columns(&self, table: &str, view: Option<&str>) -> SeaTableResult<Value>;
    fn insert_column(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        data: Option<&Value>,
    ) -> SeaTableResult<Value>;
    fn delete_column(&self, table: &str, column: &str) -> SeaTableResult<()>;
    fn add_column_options(&self, table: &str, column: &str, options: &[Value]) -> SeaTableResult<()>;

    fn list_views(&self, table: &str) -> SeaTableResult<Value>;
    fn add_view(&self, table: &str, view: &str, view_type: &str) -> SeaTableResult<Value>;
    fn delete_view(&self, table: &str, view: &str) -> SeaTableResult<()>;

    fn add_table(&self, table: &str) -> SeaTableResult<Value>;
    fn rename_table(&self, table: &str, new_name: &str) -> SeaTableResult<()>;
    fn delete_table(&self, table: &str) -> SeaTableResult<()>;
}

/// Builds and authenticates a base connection. Called at most once per
/// token by the connection cache.
pub trait Connector: Send + Sync {
    type Conn: BaseApi;

    fn connect(&self, token: &ApiToken, server_url: &str) -> SeaTableResult<Self::Conn>;
}

// ============================================================================
// HTTP IMPLEMENTATION
// ============================================================================

/// `app-access-token` response. Only the fields we use.
#[derive(Debug, Deserialize)]
struct AccessGrant {
    access_token: String,
    dtable_uuid: String,
    #[serde(default)]
    dtable_name: Option<String>,
}

pub struct HttpConnector {
    client: Client,
}

impl HttpConnector {
    pub fn new() -> SeaTableResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| SeaTableError::remote(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Connector for HttpConnector {
    type Conn = SeaTableBase;

    fn connect(&self, token: &ApiToken, server_url: &str) -> SeaTableResult<SeaTableBase> {
        let server_url = server_url.trim_end_matches('/');
        let auth_url = format!("{}/api/v2.1/dtable/app-access-token/", server_url);

        let resp = self
            .client
            .get(&auth_url)
            .header(AUTHORIZATION, format!("Token {}", token.expose()))
            .send()
            .map_err(|e| SeaTableError::AuthenticationFailed(format!("{}: {}", server_url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(SeaTableError::AuthenticationFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&body)
            )));
        }

        let grant: AccessGrant = resp.json().map_err(|e| {
            SeaTableError::AuthenticationFailed(format!("unexpected access token response: {}", e))
        })?;

        let api_root = gateway_root(server_url, &grant.dtable_uuid)?;
        log::info!(
            "Authenticated {} -> base '{}' ({})",
            token,
            grant.dtable_name.as_deref().unwrap_or("?"),
            grant.dtable_uuid
        );

        Ok(SeaTableBase {
            client: self.client.clone(),
            api_root,
            access_token: grant.access_token,
            dtable_name: grant.dtable_name,
        })
    }
}

/// `{server}/api-gateway/api/v2/dtables/{uuid}`
fn gateway_root(server_url: &str, dtable_uuid: &str) -> SeaTableResult<Url> {
    let raw = format!(
        "{}/api-gateway/api/v2/dtables/{}",
        server_url.trim_end_matches('/'),
        dtable_uuid
    );
    Url::parse(&raw)
        .map_err(|e| SeaTableError::AuthenticationFailed(format!("invalid server URL {}: {}", raw, e)))
}

/// Append path segments (percent-encoded, trailing slash) and query pairs.
fn endpoint(root: &Url, segments: &[&str], query: &[(&str, &str)]) -> SeaTableResult<Url> {
    let mut url = root.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| SeaTableError::remote(format!("cannot build endpoint from {}", root)))?;
        path.pop_if_empty();
        path.extend(segments);
        path.push("");
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn truncate(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_MAX {
        let head: String = body.chars().take(ERROR_BODY_MAX).collect();
        format!("{}…", head)
    } else {
        body.to_string()
    }
}

/// Unwrap `{"<key>": ...}` envelopes; anything else passes through.
fn take_field(mut body: Value, key: &str) -> Value {
    if let Some(v) = body.get_mut(key) {
        return v.take();
    }
    body
}

/// One authenticated SeaTable base.
pub struct SeaTableBase {
    client: Client,
    api_root: Url,
    access_token: String,
    dtable_name: Option<String>,
}

impl SeaTableBase {
    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> SeaTableResult<Url> {
        endpoint(&self.api_root, segments, query)
    }

    /// Send with the base access token. Non-2xx is RemoteOperationFailed.
    fn send(&self, req: RequestBuilder) -> SeaTableResult<Value> {
        let resp = req
            .header(AUTHORIZATION, format!("Token {}", self.access_token))
            .send()
            .map_err(|e| SeaTableError::remote(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().map_err(|e| SeaTableError::remote(format!("Read body failed: {}", e)))?;
        if !status.is_success() {
            return Err(SeaTableError::remote(format!("HTTP {}: {}", status.as_u16(), truncate(&body))));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| SeaTableError::remote(format!("Parse failed: {}: {}", e, truncate(&body))))
    }

    fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> SeaTableResult<Value> {
        let url = self.url(segments, query)?;
        self.send(self.client.get(url))
    }

    fn post(&self, segments: &[&str], query: &[(&str, &str)], body: &Value) -> SeaTableResult<Value> {
        let url = self.url(segments, query)?;
        self.send(self.client.post(url).json(body))
    }

    fn put(&self, segments: &[&str], body: &Value) -> SeaTableResult<Value> {
        let url = self.url(segments, &[])?;
        self.send(self.client.put(url).json(body))
    }

    fn delete(&self, segments: &[&str], query: &[(&str, &str)], body: Option<&Value>) -> SeaTableResult<Value> {
        let url = self.url(segments, query)?;
        let req = self.client.delete(url);
        let req = match body {
            Some(b) => req.json(b),
            None => req,
        };
        self.send(req)
    }
}

impl BaseApi for SeaTableBase {
    fn dtable_name(&self) -> Option<&str> {
        self.dtable_name.as_deref()
    }

    fn list_rows(&self, table: &str, view: Option<&str>, limit: u32) -> SeaTableResult<Value> {
        let limit = limit.to_string();
        let mut query = vec![
            ("table_name", table),
            ("start", "0"),
            ("limit", limit.as_str()),
            ("convert_keys", "true"),
        ];
        if let Some(v) = view {
            query.push(("view_name", v));
        }
        Ok(take_field(self.get(&["rows"], &query)?, "rows"))
    }

    fn append_row(&self, table: &str, row: &Value) -> SeaTableResult<Value> {
        let body = json!({ "table_name": table, "rows": [row] });
        Ok(take_field(self.post(&["rows"], &[], &body)?, "first_row"))
    }

    fn update_row(&self, table: &str, row_id: &str, row: &Value) -> SeaTableResult<()> {
        let body = json!({
            "table_name": table,
            "updates": [{ "row_id": row_id, "row": row }],
        });
        self.put(&["rows"], &body).map(|_| ())
    }

    fn delete_row(&self, table: &str, row_id: &str) -> SeaTableResult<()> {
        let body = json!({ "table_name": table, "row_ids": [row_id] });
        self.delete(&["rows"], &[], Some(&body)).map(|_| ())
    }

    fn get_metadata(&self) -> SeaTableResult<Value> {
        Ok(take_field(self.get(&["metadata"], &[])?, "metadata"))
    }

    fn query(&self, sql: &str) -> SeaTableResult<Value> {
        let body = json!({ "sql": sql, "convert_keys": true });
        let resp = self.post(&["sql"], &[], &body)?;
        if resp.get("success").and_then(Value::as_bool) == Some(false) {
            let msg = resp
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("SQL query failed");
            return Err(SeaTableError::remote(msg));
        }
        Ok(take_field(resp, "results"))
    }

    fn list_columns(&self, table: &str, view: Option<&str>) -> SeaTableResult<Value> {
        let mut query = vec![("table_name", table)];
        if let Some(v) = view {
            query.push(("view_name", v));
        }
        Ok(take_field(self.get(&["columns"], &query)?, "columns"))
    }

    fn insert_column(
        &self,
        table: &str,
        column: &str,
        column_type: ColumnType,
        data: Option<&Value>,
    ) -> SeaTableResult<Value> {
        let mut body = json!({
            "table_name": table,
            "column_name": column,
            "column_type": column_type.code(),
        });
        if let Some(d) = data {
            body["column_data"] = d.clone();
        }
        self.post(&["columns"], &[], &body)
    }

    fn delete_column(&self, table: &str, column: &str) -> SeaTableResult<()> {
        let body = json!({ "table_name": table, "column": column });
        self.delete(&["columns"], &[], Some(&body)).map(|_| ())
    }

    fn add_column_options(&self, table: &str, column: &str, options: &[Value]) -> SeaTableResult<()> {
        let body = json!({ "table_name": table, "column": column, "options": options });
        self.post(&["column-options"], &[], &body).map(|_| ())
    }

    fn list_views(&self, table: &str) -> SeaTableResult<Value> {
        Ok(take_field(self.get(&["views"], &[("table_name", table)])?, "views"))
    }

    fn add_view(&self, table: &str, view: &str, view_type: &str) -> SeaTableResult<Value> {
        let body = json!({ "name": view, "type": view_type });
        self.post(&["views"], &[("table_name", table)], &body)
    }

    fn delete_view(&self, table: &str, view: &str) -> SeaTableResult<()> {
        self.delete(&["views", view], &[("table_name", table)], None).map(|_| ())
    }

    fn add_table(&self, table: &str) -> SeaTableResult<Value> {
        self.post(&["tables"], &[], &json!({ "table_name": table }))
    }

    fn rename_table(&self, table: &str, new_name: &str) -> SeaTableResult<()> {
        let body = json!({ "table_name": table, "new_table_name": new_name });
        self.put(&["tables"], &body).map(|_| ())
    }

    fn delete_table(&self, table: &str) -> SeaTableResult<()> {
        self.delete(&["tables"], &[], Some(&json!({ "table_name": table }))).map(|_| ())
    }
}

// ============================================================================
// TESTS
// ============================================================================
