// SeaTable MCP Gateway - API Token
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Opaque SeaTable API token. Cache key and auth secret in one.
// Debug/Display never print the secret, only a SHA-256 fingerprint.

use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a raw token verbatim. Blank tokens count as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self(raw))
    }

    /// Raw secret, for the Authorization header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First 8 hex chars of SHA-256(token). Safe for logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..4])
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiToken({})", self.fingerprint())
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}", self.fingerprint())
    }
}
