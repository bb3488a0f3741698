// SeaTable MCP Gateway - Credential Resolution
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Picks the API token for one tool call. Precedence, first hit wins:
//   1. explicit token from the caller (verbatim, no lookup)
//   2. first config entry whose base name equals the requested base
//   3. SEATABLE_API_TOKEN default
//   4. first config entry
//   5. MissingCredential

use crate::config::ConfigEntry;
use crate::error::{SeaTableError, SeaTableResult};
use crate::token::ApiToken;

/// Which rule produced the token. Logged, and asserted on in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Explicit,
    BaseName,
    EnvDefault,
    FirstEntry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub token: ApiToken,
    pub source: Source,
}

/// Resolve the token for a call. Blank strings count as not provided.
pub fn resolve(
    explicit: Option<&str>,
    base_name: Option<&str>,
    config: &[ConfigEntry],
    env_default: Option<&ApiToken>,
) -> SeaTableResult<Resolved> {
    if let Some(token) = explicit.and_then(ApiToken::new) {
        return Ok(Resolved { token, source: Source::Explicit });
    }

    let base_name = base_name.filter(|b| !b.trim().is_empty());

    if let Some(name) = base_name {
        if let Some(entry) = config.iter().find(|e| e.matches(name)) {
            return Ok(Resolved { token: entry.api_token.clone(), source: Source::BaseName });
        }
        log::debug!("Base '{}' not in config, falling back", name);
    }

    if let Some(token) = env_default {
        return Ok(Resolved { token: token.clone(), source: Source::EnvDefault });
    }

    if let Some(first) = config.first() {
        return Ok(Resolved { token: first.api_token.clone(), source: Source::FirstEntry });
    }

    Err(SeaTableError::MissingCredential { base: base_name.map(str::to_string) })
}

// ============================================================================
// TESTS
// ============================================================================
