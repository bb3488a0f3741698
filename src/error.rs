// SeaTable MCP Gateway - Error Types
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Structured errors raised by the resolver, the connection cache and the
// remote client. Only tools.rs turns these into text.

use thiserror::Error;

/// Result type for gateway operations.
pub type SeaTableResult<T> = Result<T, SeaTableError>;

#[derive(Debug, Error)]
pub enum SeaTableError {
    /// No credential could be resolved for the call.
    #[error("{}", missing_credential_message(.base))]
    MissingCredential { base: Option<String> },

    /// Token handshake rejected or the server was unreachable.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Column type name not in the SeaTable column type set.
    #[error("unsupported column type '{0}'")]
    UnsupportedColumnType(String),

    /// Any other failure reported by the remote service.
    #[error("{0}")]
    RemoteOperationFailed(String),

    /// Tool argument missing or of the wrong JSON kind.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn missing_credential_message(base: &Option<String>) -> String {
    match base {
        Some(name) => format!(
            "no API token found for base '{}' and SEATABLE_API_TOKEN is not set",
            name
        ),
        None => "no API token configured and SEATABLE_API_TOKEN is not set".to_string(),
    }
}

impl SeaTableError {
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteOperationFailed(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Short kind tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::UnsupportedColumnType(_) => "unsupported_column_type",
            Self::RemoteOperationFailed(_) => "remote_operation_failed",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_requested_base() {
        let err = SeaTableError::MissingCredential { base: Some("Sales".to_string()) };
        let msg = err.to_string();
        assert!(msg.contains("'Sales'"), "{}", msg);
        assert!(msg.contains("SEATABLE_API_TOKEN"));
    }

    #[test]
    fn missing_credential_without_base() {
        let err = SeaTableError::MissingCredential { base: None };
        assert_eq!(err.to_string(), "no API token configured and SEATABLE_API_TOKEN is not set");
        assert_eq!(err.kind(), "missing_credential");
    }

    #[test]
    fn remote_failure_keeps_message_verbatim() {
        let err = SeaTableError::remote("timeout");
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn unsupported_column_type_quotes_name() {
        let err = SeaTableError::UnsupportedColumnType("bitmap".to_string());
        assert_eq!(err.to_string(), "unsupported column type 'bitmap'");
    }
}
