// SeaTable MCP Gateway - Tool Operations
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every tool: parse args -> resolve token -> cached connection -> one
// BaseApi call -> text. Errors stay structured until render(), the only
// place they become "<label>: <reason>" text. Nothing escapes as a panic
// or an Err past ToolHost::call.

use crate::cache::ConnectionCache;
use crate::column::ColumnType;
use crate::config::{ConfigSource, Defaults};
use crate::error::{SeaTableError, SeaTableResult};
use crate::resolve::resolve;
use crate::seatable::{BaseApi, Connector};
use crate::token::ApiToken;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const DEFAULT_ROW_LIMIT: u32 = 100;
const DEFAULT_VIEW_TYPE: &str = "table";
const OPTION_COLOR: &str = "#666666";
const OPTION_TEXT_COLOR: &str = "#FFFFFF";

// ============================================================================
// TOOL CATALOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    ListRows,
    AddRow,
    UpdateRow,
    DeleteRow,
    GetBaseInfo,
    RunSql,
    ListColumns,
    InsertColumn,
    DeleteColumn,
    AddSelectOptions,
    ListViews,
    CreateView,
    DeleteView,
    CreateTable,
    RenameTable,
    DeleteTable,
    GetServerInfo,
    ListBases,
}

impl Tool {
    pub const ALL: [Tool; 18] = [
        Tool::ListRows,
        Tool::AddRow,
        Tool::UpdateRow,
        Tool::DeleteRow,
        Tool::GetBaseInfo,
        Tool::RunSql,
        Tool::ListColumns,
        Tool::InsertColumn,
        Tool::DeleteColumn,
        Tool::AddSelectOptions,
        Tool::ListViews,
        Tool::CreateView,
        Tool::DeleteView,
        Tool::CreateTable,
        Tool::RenameTable,
        Tool::DeleteTable,
        Tool::GetServerInfo,
        Tool::ListBases,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::ListRows => "list_rows",
            Tool::AddRow => "add_row",
            Tool::UpdateRow => "update_row",
            Tool::DeleteRow => "delete_row",
            Tool::GetBaseInfo => "get_base_info",
            Tool::RunSql => "run_sql",
            Tool::ListColumns => "list_columns",
            Tool::InsertColumn => "insert_column",
            Tool::DeleteColumn => "delete_column",
            Tool::AddSelectOptions => "add_select_options",
            Tool::ListViews => "list_views",
            Tool::CreateView => "create_view",
            Tool::DeleteView => "delete_view",
            Tool::CreateTable => "create_table",
            Tool::RenameTable => "rename_table",
            Tool::DeleteTable => "delete_table",
            Tool::GetServerInfo => "get_server_info",
            Tool::ListBases => "list_bases",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Prefix for error text returned by this tool.
    pub fn error_label(self) -> &'static str {
        match self {
            Tool::ListRows => "Error listing rows",
            Tool::AddRow => "Error adding row",
            Tool::UpdateRow => "Error updating row",
            Tool::DeleteRow => "Error deleting row",
            Tool::GetBaseInfo => "Error getting base info",
            Tool::RunSql => "Error executing SQL",
            Tool::ListColumns => "Error listing columns",
            Tool::InsertColumn => "Error inserting column",
            Tool::DeleteColumn => "Error deleting column",
            Tool::AddSelectOptions => "Error adding options",
            Tool::ListViews => "Error listing views",
            Tool::CreateView => "Error creating view",
            Tool::DeleteView => "Error deleting view",
            Tool::CreateTable => "Error creating table",
            Tool::RenameTable => "Error renaming table",
            Tool::DeleteTable => "Error deleting table",
            Tool::GetServerInfo => "Error getting server info",
            Tool::ListBases => "Error listing bases",
        }
    }

    /// Whether the tool takes `base_name` / `api_token`.
    fn selects_base(self) -> bool {
        !matches!(self, Tool::GetServerInfo | Tool::ListBases)
    }
}

/// MCP tool definition helper. Base-scoped tools get the two
/// identification parameters appended.
fn tool_def(tool: Tool, description: &str, mut properties: Value, required: Vec<&str>) -> Value {
    if tool.selects_base() {
        if let Some(obj) = properties.as_object_mut() {
            obj.insert(
                "base_name".to_string(),
                json!({"type": "string", "description": "Optional name of the base (from config) to look up the API token"}),
            );
            obj.insert(
                "api_token".to_string(),
                json!({"type": "string", "description": "Optional API token; overrides base_name and config"}),
            );
        }
    }
    json!({
        "name": tool.name(),
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

/// Every registered tool, in catalog order.
pub fn tool_definitions() -> Vec<Value> {
    Tool::ALL.iter().map(|t| definition(*t)).collect()
}

fn definition(tool: Tool) -> Value {
    match tool {
        // ====== ROWS ======
        Tool::ListRows => tool_def(
            tool,
            "List rows from a SeaTable table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table to list rows from"},
                "view_name": {"type": "string", "description": "Optional name of the view to filter rows"},
                "limit": {"type": "integer", "description": "Maximum number of rows to return (default 100)", "default": DEFAULT_ROW_LIMIT}
            }),
            vec!["table_name"],
        ),
        Tool::AddRow => tool_def(
            tool,
            "Add a new row to a SeaTable table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "row_data": {"type": "object", "description": "Column name -> value for the new row"}
            }),
            vec!["table_name", "row_data"],
        ),
        Tool::UpdateRow => tool_def(
            tool,
            "Update an existing row in a SeaTable table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "row_id": {"type": "string", "description": "The ID of the row to update"},
                "row_data": {"type": "object", "description": "Column name -> new value"}
            }),
            vec!["table_name", "row_id", "row_data"],
        ),
        Tool::DeleteRow => tool_def(
            tool,
            "Delete a row from a SeaTable table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "row_id": {"type": "string", "description": "The ID of the row to delete"}
            }),
            vec!["table_name", "row_id"],
        ),

        // ====== BASE ======
        Tool::GetBaseInfo => tool_def(
            tool,
            "Get metadata about the base (tables, columns, views).",
            json!({}),
            vec![],
        ),
        Tool::RunSql => tool_def(
            tool,
            "Execute a SQL query against the SeaTable base.",
            json!({
                "query": {"type": "string", "description": "The SQL query string"}
            }),
            vec!["query"],
        ),

        // ====== COLUMNS ======
        Tool::ListColumns => tool_def(
            tool,
            "List all columns in a table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "view_name": {"type": "string", "description": "Optional view name"}
            }),
            vec!["table_name"],
        ),
        Tool::InsertColumn => tool_def(
            tool,
            "Insert a new column into a table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "column_name": {"type": "string", "description": "The name of the new column"},
                "column_type": {"type": "string", "description": "Column type, e.g. text, number, date, single-select, checkbox"},
                "data": {"type": "object", "description": "Optional column options (column_data)"}
            }),
            vec!["table_name", "column_name", "column_type"],
        ),
        Tool::DeleteColumn => tool_def(
            tool,
            "Delete a column from a table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "column_name": {"type": "string", "description": "The name of the column to delete"}
            }),
            vec!["table_name", "column_name"],
        ),
        Tool::AddSelectOptions => tool_def(
            tool,
            "Add options to a single or multiple select column.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "column_name": {"type": "string", "description": "The name of the column"},
                "options": {"type": "array", "description": "Options to add: strings, or objects with name/color/textColor"}
            }),
            vec!["table_name", "column_name", "options"],
        ),

        // ====== VIEWS ======
        Tool::ListViews => tool_def(
            tool,
            "List all views in a table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"}
            }),
            vec!["table_name"],
        ),
        Tool::CreateView => tool_def(
            tool,
            "Create a new view in a table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "view_name": {"type": "string", "description": "The name of the new view"},
                "view_type": {"type": "string", "description": "The type of view (default 'table')", "default": DEFAULT_VIEW_TYPE}
            }),
            vec!["table_name", "view_name"],
        ),
        Tool::DeleteView => tool_def(
            tool,
            "Delete a view from a table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table"},
                "view_name": {"type": "string", "description": "The name of the view to delete"}
            }),
            vec!["table_name", "view_name"],
        ),

        // ====== TABLES ======
        Tool::CreateTable => tool_def(
            tool,
            "Create a new table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the new table"}
            }),
            vec!["table_name"],
        ),
        Tool::RenameTable => tool_def(
            tool,
            "Rename a table.",
            json!({
                "table_name": {"type": "string", "description": "The current name of the table"},
                "new_table_name": {"type": "string", "description": "The new name for the table"}
            }),
            vec!["table_name", "new_table_name"],
        ),
        Tool::DeleteTable => tool_def(
            tool,
            "Delete a table.",
            json!({
                "table_name": {"type": "string", "description": "The name of the table to delete"}
            }),
            vec!["table_name"],
        ),

        // ====== SERVER ======
        Tool::GetServerInfo => tool_def(
            tool,
            "Get information about the SeaTable server and its default base.",
            json!({}),
            vec![],
        ),
        Tool::ListBases => tool_def(
            tool,
            "List base names available in the gateway config.",
            json!({}),
            vec![],
        ),
    }
}

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Identification accepted by every base-scoped tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseSelector {
    #[serde(default)]
    pub base_name: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListRowsArgs {
    table_name: String,
    #[serde(default)]
    view_name: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(flatten)]
    base: BaseSelector,
}

#[derive(Debug, Deserialize)]
struct RowArgs {
    table_name: String,
    #[serde(default)]
    row_id: Option<String>,
    #[serde(default)]
    row_data: Option<Map<String, Value>>,
    #[serde(flatten)]
    base: BaseSelector,
}

#[derive(Debug, Deserialize)]
struct SqlArgs {
    query: String,
    #[serde(flatten)]
    base: BaseSelector,
}

#[derive(Debug, Deserialize)]
struct TableArgs {
    table_name: String,
    #[serde(default)]
    view_name: Option<String>,
    #[serde(default)]
    new_table_name: Option<String>,
    #[serde(flatten)]
    base: BaseSelector,
}

#[derive(Debug, Deserialize)]
struct ColumnArgs {
    table_name: String,
    column_name: String,
    #[serde(default)]
    column_type: Option<String>,
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    options: Option<Vec<Value>>,
    #[serde(flatten)]
    base: BaseSelector,
}

#[derive(Debug, Deserialize)]
struct ViewArgs {
    table_name: String,
    view_name: String,
    #[serde(default)]
    view_type: Option<String>,
    #[serde(flatten)]
    base: BaseSelector,
}

fn parse<T: DeserializeOwned>(args: &Value) -> SeaTableResult<T> {
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args).map_err(|e| SeaTableError::invalid(e.to_string()))
}

fn required<T>(value: Option<T>, name: &str) -> SeaTableResult<T> {
    value.ok_or_else(|| SeaTableError::invalid(format!("missing field `{}`", name)))
}

/// Plain strings become gray options; objects pass through untouched.
fn select_options(options: Vec<Value>) -> SeaTableResult<Vec<Value>> {
    options
        .into_iter()
        .map(|opt| match opt {
            Value::String(name) => Ok(json!({
                "name": name,
                "color": OPTION_COLOR,
                "textColor": OPTION_TEXT_COLOR,
            })),
            Value::Object(_) => Ok(opt),
            other => Err(SeaTableError::invalid(format!(
                "select option must be a string or object, got {}",
                other
            ))),
        })
        .collect()
}

fn pretty(value: &Value) -> String {
    format!("{:#}", value)
}

// ============================================================================
// TOOL HOST
// ============================================================================

/// Text result of one tool call. `is_error` maps to MCP `isError`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn ok(text: String) -> Self {
        Self { text, is_error: false }
    }

    fn error(text: String) -> Self {
        Self { text, is_error: true }
    }
}

/// Owns the connection cache and the config source. One per server.
pub struct ToolHost<C: Connector> {
    cache: ConnectionCache<C>,
    config: Box<dyn ConfigSource>,
    default_token: Option<ApiToken>,
}

impl<C: Connector> ToolHost<C> {
    pub fn new(connector: C, config: Box<dyn ConfigSource>, defaults: Defaults) -> Self {
        Self {
            cache: ConnectionCache::new(connector, defaults.server_url),
            config,
            default_token: defaults.api_token,
        }
    }

    pub fn cache(&self) -> &ConnectionCache<C> {
        &self.cache
    }

    pub fn config(&self) -> &dyn ConfigSource {
        self.config.as_ref()
    }

    /// Resolve the token for `sel` and return its connection.
    pub fn base(&self, sel: &BaseSelector) -> SeaTableResult<Arc<C::Conn>> {
        let entries = self.config.entries();
        let resolved = resolve(
            sel.api_token.as_deref(),
            sel.base_name.as_deref(),
            &entries,
            self.default_token.as_ref(),
        )?;
        log::debug!(
            "Resolved {} via {:?} (base_name={:?})",
            resolved.token,
            resolved.source,
            sel.base_name
        );
        self.cache.get(&resolved.token)
    }

    /// Run a tool by name. Always returns text.
    pub fn call(&self, name: &str, args: &Value) -> ToolOutput {
        match Tool::from_name(name) {
            Some(tool) => render(tool, self.execute(tool, args)),
            None => ToolOutput::error(format!("Unknown tool: {}", name)),
        }
    }

    fn execute(&self, tool: Tool, args: &Value) -> SeaTableResult<String> {
        match tool {
            // ====== ROWS ======
            Tool::ListRows => {
                let a: ListRowsArgs = parse(args)?;
                let limit = a.limit.unwrap_or(DEFAULT_ROW_LIMIT);
                let rows = self.base(&a.base)?.list_rows(&a.table_name, a.view_name.as_deref(), limit)?;
                Ok(pretty(&rows))
            }
            Tool::AddRow => {
                let a: RowArgs = parse(args)?;
                let row = Value::Object(required(a.row_data, "row_data")?);
                let added = self.base(&a.base)?.append_row(&a.table_name, &row)?;
                Ok(format!("Row added successfully: {}", added))
            }
            Tool::UpdateRow => {
                let a: RowArgs = parse(args)?;
                let row_id = required(a.row_id, "row_id")?;
                let row = Value::Object(required(a.row_data, "row_data")?);
                self.base(&a.base)?.update_row(&a.table_name, &row_id, &row)?;
                Ok(format!("Row {} updated successfully.", row_id))
            }
            Tool::DeleteRow => {
                let a: RowArgs = parse(args)?;
                let row_id = required(a.row_id, "row_id")?;
                self.base(&a.base)?.delete_row(&a.table_name, &row_id)?;
                Ok(format!("Row {} deleted successfully.", row_id))
            }

            // ====== BASE ======
            Tool::GetBaseInfo => {
                let sel: BaseSelector = parse(args)?;
                Ok(pretty(&self.base(&sel)?.get_metadata()?))
            }
            Tool::RunSql => {
                let a: SqlArgs = parse(args)?;
                Ok(pretty(&self.base(&a.base)?.query(&a.query)?))
            }

            // ====== COLUMNS ======
            Tool::ListColumns => {
                let a: TableArgs = parse(args)?;
                let cols = self.base(&a.base)?.list_columns(&a.table_name, a.view_name.as_deref())?;
                Ok(pretty(&cols))
            }
            Tool::InsertColumn => {
                let a: ColumnArgs = parse(args)?;
                let column_type = ColumnType::parse(&required(a.column_type, "column_type")?)?;
                let data = a.data.map(Value::Object);
                self.base(&a.base)?.insert_column(&a.table_name, &a.column_name, column_type, data.as_ref())?;
                Ok(format!("Column '{}' inserted successfully.", a.column_name))
            }
            Tool::DeleteColumn => {
                let a: ColumnArgs = parse(args)?;
                self.base(&a.base)?.delete_column(&a.table_name, &a.column_name)?;
                Ok(format!("Column '{}' deleted successfully.", a.column_name))
            }
            Tool::AddSelectOptions => {
                let a: ColumnArgs = parse(args)?;
                let options = select_options(required(a.options, "options")?)?;
                self.base(&a.base)?.add_column_options(&a.table_name, &a.column_name, &options)?;
                Ok(format!("Options added to column '{}'.", a.column_name))
            }

            // ====== VIEWS ======
            Tool::ListViews => {
                let a: TableArgs = parse(args)?;
                Ok(pretty(&self.base(&a.base)?.list_views(&a.table_name)?))
            }
            Tool::CreateView => {
                let a: ViewArgs = parse(args)?;
                let view_type = a.view_type.as_deref().unwrap_or(DEFAULT_VIEW_TYPE);
                self.base(&a.base)?.add_view(&a.table_name, &a.view_name, view_type)?;
                Ok(format!("View '{}' created successfully.", a.view_name))
            }
            Tool::DeleteView => {
                let a: ViewArgs = parse(args)?;
                self.base(&a.base)?.delete_view(&a.table_name, &a.view_name)?;
                Ok(format!("View '{}' deleted successfully.", a.view_name))
            }

            // ====== TABLES ======
            Tool::CreateTable => {
                let a: TableArgs = parse(args)?;
                self.base(&a.base)?.add_table(&a.table_name)?;
                Ok(format!("Table '{}' created successfully.", a.table_name))
            }
            Tool::RenameTable => {
                let a: TableArgs = parse(args)?;
                let new_name = required(a.new_table_name, "new_table_name")?;
                self.base(&a.base)?.rename_table(&a.table_name, &new_name)?;
                Ok(format!("Table '{}' renamed to '{}'.", a.table_name, new_name))
            }
            Tool::DeleteTable => {
                let a: TableArgs = parse(args)?;
                self.base(&a.base)?.delete_table(&a.table_name)?;
                Ok(format!("Table '{}' deleted successfully.", a.table_name))
            }

            // ====== SERVER ======
            Tool::GetServerInfo => {
                let base = self.base(&BaseSelector::default())?;
                let metadata = base.get_metadata()?;
                Ok(format!(
                    "Server: {}\nBase: {}\nMetadata: {}",
                    self.cache.server_url(),
                    base.dtable_name().unwrap_or("(unknown)"),
                    pretty(&metadata)
                ))
            }
            Tool::ListBases => Ok(self.list_bases()),
        }
    }

    fn list_bases(&self) -> String {
        let entries = self.config.entries();
        let default = match &self.default_token {
            Some(t) => format!("SEATABLE_API_TOKEN: set ({})", t),
            None => "SEATABLE_API_TOKEN: not set".to_string(),
        };
        if entries.is_empty() {
            return format!("No bases configured in {}.\n{}", self.config.describe(), default);
        }
        let mut out = format!("Configured bases ({}):\n", self.config.describe());
        for entry in &entries {
            out.push_str(&format!(
                "- {} ({})\n",
                entry.base_name.as_deref().unwrap_or("(unnamed)"),
                entry.api_token
            ));
        }
        out.push_str(&default);
        out
    }
}

/// The one place errors become text.
fn render(tool: Tool, result: SeaTableResult<String>) -> ToolOutput {
    match result {
        Ok(text) => ToolOutput::ok(text),
        Err(e) => {
            log::warn!("{} failed [{}]: {}", tool.name(), e.kind(), e);
            ToolOutput::error(format!("{}: {}", tool.error_label(), e))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
