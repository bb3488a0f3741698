// SeaTable MCP Gateway - Configuration
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Base list (base name -> API token) from a JSON file, plus process
// defaults from the environment. A missing or broken file is an empty
// list, never a startup failure.

use crate::token::ApiToken;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const ENV_CONFIG_PATH: &str = "SEATABLE_CONFIG_PATH";
pub const ENV_API_TOKEN: &str = "SEATABLE_API_TOKEN";
pub const ENV_SERVER_URL: &str = "SEATABLE_SERVER_URL";

pub const DEFAULT_CONFIG_FILE: &str = "seatable_config.json";
pub const DEFAULT_SERVER_URL: &str = "https://table.nju.edu.cn";

/// One configured base. Order in the file is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    /// Logical base name. `None` never matches a lookup.
    pub base_name: Option<String>,
    pub api_token: ApiToken,
}

impl ConfigEntry {
    pub fn matches(&self, base_name: &str) -> bool {
        self.base_name.as_deref() == Some(base_name)
    }
}

/// Keys accepted for each field, highest priority first. Older files used
/// `table_name` for the base name. Other keys are ignored.
const NAME_KEYS: &[&str] = &["base_name", "table_name", "name", "id"];
const TOKEN_KEYS: &[&str] = &["api_token", "token"];

/// String values of `keys` present in `obj`, in key order.
fn string_values<'a>(obj: &'a Map<String, Value>, keys: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    keys.iter().filter_map(move |k| obj.get(*k).and_then(Value::as_str))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFile {
    List(Vec<Value>),
    Wrapped { bases: Vec<Value> },
}

/// Parse config file content. Entries that are not objects, or that lack a
/// usable token, are skipped with a warning.
pub fn parse_entries(content: &str) -> Result<Vec<ConfigEntry>, serde_json::Error> {
    let raw = match serde_json::from_str::<RawFile>(content)? {
        RawFile::List(items) => items,
        RawFile::Wrapped { bases } => bases,
    };

    let mut entries = Vec::with_capacity(raw.len());
    for (idx, item) in raw.into_iter().enumerate() {
        let obj = match item.as_object() {
            Some(o) => o,
            None => {
                log::warn!("Config entry #{} skipped: not an object", idx);
                continue;
            }
        };
        let base_name = string_values(obj, NAME_KEYS).find(|n| !n.is_empty()).map(str::to_string);
        match string_values(obj, TOKEN_KEYS).find_map(ApiToken::new) {
            Some(api_token) => entries.push(ConfigEntry { base_name, api_token }),
            None => log::warn!(
                "Config entry #{} ({}) has no api_token, skipped",
                idx,
                base_name.as_deref().unwrap_or("unnamed")
            ),
        }
    }
    Ok(entries)
}

/// Anything that can hand the resolver an ordered base list.
pub trait ConfigSource: Send + Sync {
    fn entries(&self) -> Vec<ConfigEntry>;

    /// Where the entries come from, for status output.
    fn describe(&self) -> String;
}

/// JSON config file, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for JsonFileConfig {
    fn entries(&self) -> Vec<ConfigEntry> {
        if !self.path.exists() {
            log::debug!("Config not found at {:?}, no bases configured", self.path);
            return Vec::new();
        }
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Error reading config file {:?}: {}", self.path, e);
                return Vec::new();
            }
        };
        match parse_entries(&content) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Error loading config file {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl ConfigSource for Vec<ConfigEntry> {
    fn entries(&self) -> Vec<ConfigEntry> {
        self.clone()
    }

    fn describe(&self) -> String {
        format!("in-memory ({} bases)", self.len())
    }
}

/// Config file location: CLI flag, then SEATABLE_CONFIG_PATH, then
/// `seatable_config.json` in the working directory.
pub fn config_path(cli: Option<PathBuf>, env: Option<String>) -> PathBuf {
    cli.or_else(|| env.filter(|p| !p.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Process-wide defaults taken from the environment at startup.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub api_token: Option<ApiToken>,
    pub server_url: String,
}

impl Defaults {
    pub fn new(api_token: Option<&str>, server_url: Option<&str>) -> Self {
        let server_url = server_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            api_token: api_token.and_then(ApiToken::new),
            server_url,
        }
    }

    pub fn from_env() -> Self {
        let token = std::env::var(ENV_API_TOKEN).ok();
        let url = std::env::var(ENV_SERVER_URL).ok();
        Self::new(token.as_deref(), url.as_deref())
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_plain_list_in_order() {
        let entries = parse_entries(
            r#"[{"base_name":"Sales","api_token":"tok-1"},{"base_name":"HR","api_token":"tok-2"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].base_name.as_deref(), Some("Sales"));
        assert_eq!(entries[1].api_token.expose(), "tok-2");
    }

    #[test]
    fn accepts_legacy_and_short_keys() {
        let entries = parse_entries(
            r#"[{"table_name":"Old","api_token":"a"},{"id":"Short","token":"b"},{"name":"Named","api_token":"c"}]"#,
        )
        .unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.base_name.clone().unwrap()).collect();
        assert_eq!(names, vec!["Old", "Short", "Named"]);
    }

    #[test]
    fn extra_and_alias_keys_do_not_drop_entry() {
        let entries = parse_entries(
            r#"[{"id":"rec-1","base_name":"Sales","api_token":"tok-1"},{"base_name":"HR","api_token":"tok-2","token":"old"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].matches("Sales"));
        assert_eq!(entries[0].api_token.expose(), "tok-1");
        assert!(entries[1].matches("HR"));
        assert_eq!(entries[1].api_token.expose(), "tok-2");
    }

    #[test]
    fn blank_or_non_string_keys_fall_through() {
        let entries = parse_entries(
            r#"[{"base_name":"","id":"Fallback","api_token":"  ","token":"tok-9"},{"id":7,"name":"Numeric","token":"t"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].matches("Fallback"));
        assert_eq!(entries[0].api_token.expose(), "tok-9");
        assert!(entries[1].matches("Numeric"));
    }

    #[test]
    fn accepts_wrapped_bases_object() {
        let entries = parse_entries(r#"{"bases":[{"base_name":"A","api_token":"t"}]}"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].matches("A"));
    }

    #[test]
    fn entries_without_token_are_dropped() {
        let entries = parse_entries(
            r#"[{"base_name":"NoToken"},{"base_name":"Blank","api_token":""},42,{"base_name":"Ok","api_token":"t"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].matches("Ok"));
    }

    #[test]
    fn entry_without_name_never_matches() {
        let entries = parse_entries(r#"[{"api_token":"t"}]"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].base_name.is_none());
        assert!(!entries[0].matches(""));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(parse_entries("not json").is_err());
        assert!(parse_entries(r#"{"other": 1}"#).is_err());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileConfig::new(dir.path().join("absent.json"));
        assert!(source.entries().is_empty());
    }

    #[test]
    fn broken_file_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ definitely not json").unwrap();
        let source = JsonFileConfig::new(file.path());
        assert!(source.entries().is_empty());
    }

    #[test]
    fn file_is_reread_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bases.json");
        std::fs::write(&path, r#"[{"base_name":"A","api_token":"t1"}]"#).unwrap();
        let source = JsonFileConfig::new(&path);
        assert_eq!(source.entries().len(), 1);

        std::fs::write(
            &path,
            r#"[{"base_name":"A","api_token":"t1"},{"base_name":"B","api_token":"t2"}]"#,
        )
        .unwrap();
        assert_eq!(source.entries().len(), 2);
    }

    #[test]
    fn config_path_precedence() {
        assert_eq!(
            config_path(Some(PathBuf::from("/cli.json")), Some("/env.json".to_string())),
            PathBuf::from("/cli.json")
        );
        assert_eq!(config_path(None, Some("/env.json".to_string())), PathBuf::from("/env.json"));
        assert_eq!(config_path(None, Some(String::new())), PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(config_path(None, None), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn defaults_fallback_server_url() {
        let d = Defaults::default();
        assert_eq!(d.server_url, DEFAULT_SERVER_URL);
        assert!(d.api_token.is_none());
    }

    #[test]
    fn defaults_trim_trailing_slash_and_blank_token() {
        let d = Defaults::new(Some(""), Some("https://cloud.seatable.io/"));
        assert_eq!(d.server_url, "https://cloud.seatable.io");
        assert!(d.api_token.is_none());
    }
}
