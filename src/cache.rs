// SeaTable MCP Gateway - Connection Cache
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// API token -> authenticated base connection. Unbounded, no eviction.
// At most one successful handshake per token: the lock is held across
// check -> connect -> insert, so concurrent first uses cannot both auth.
// Failed handshakes are not cached.

use crate::error::SeaTableResult;
use crate::seatable::Connector;
use crate::token::ApiToken;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct ConnectionCache<C: Connector> {
    connector: C,
    server_url: String,
    entries: Mutex<HashMap<ApiToken, Arc<C::Conn>>>,
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C, server_url: impl Into<String>) -> Self {
        Self {
            connector,
            server_url: server_url.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ApiToken, Arc<C::Conn>>> {
        // A panic mid-connect never leaves a half-inserted entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached connection for `token`, or connect + authenticate + cache.
    /// The map lock is held through the handshake, so a hit on one token
    /// waits behind another token's first connect (up to the HTTP timeout).
    pub fn get(&self, token: &ApiToken) -> SeaTableResult<Arc<C::Conn>> {
        let mut entries = self.lock();
        if let Some(conn) = entries.get(token) {
            return Ok(Arc::clone(conn));
        }

        log::debug!("No cached connection for {}, authenticating", token);
        let conn = match self.connector.connect(token, &self.server_url) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                log::warn!("Authentication failed for {}: {}", token, e);
                return Err(e);
            }
        };
        entries.insert(token.clone(), Arc::clone(&conn));
        log::info!("Cached connection for {} ({} total)", token, entries.len());
        Ok(conn)
    }

    pub fn contains(&self, token: &ApiToken) -> bool {
        self.lock().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every cached connection. Nothing is closed or revoked remotely;
    /// the next call per token authenticates again.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        log::info!("Connection cache cleared ({} dropped)", dropped);
    }
}

// ============================================================================
// TESTS
// ============================================================================
