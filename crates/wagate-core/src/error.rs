// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the wagate gateway.

use thiserror::Error;

/// The primary error type used across the wagate workspace.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// WhatsApp Cloud API errors, carrying the HTTP status and response body
    /// when the provider answered at all.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// Flow graph errors surfaced by the execution engine.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// HTTP surface errors (failed to bind, serve, or upgrade).
    #[error("server error: {message}")]
    Server {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Structural flow errors. These complete the session and surface an
/// operator-visible message when they occur mid-flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// The flow id has no stored graph.
    #[error("flow {0} not found")]
    GraphNotFound(String),

    /// The flow's graph has no node with `isStart = true`.
    #[error("no start node in flow {0}")]
    NoStartNode(String),

    /// The session's current node no longer exists in the graph.
    #[error("node {node} not found in flow {flow}")]
    NodeMissing { flow: String, node: String },
}

impl GatewayError {
    /// Shorthand for a provider error without an HTTP response.
    pub fn provider(message: impl Into<String>) -> Self {
        GatewayError::Provider {
            message: message.into(),
            status: None,
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_errors_render_ids() {
        let err = FlowError::NodeMissing {
            flow: "f1".into(),
            node: "n3".into(),
        };
        assert_eq!(err.to_string(), "node n3 not found in flow f1");
        assert_eq!(
            FlowError::GraphNotFound("f2".into()).to_string(),
            "flow f2 not found"
        );
    }

    #[test]
    fn provider_error_carries_status_and_body() {
        let err = GatewayError::Provider {
            message: "API error".into(),
            status: Some(401),
            body: Some(r#"{"error":"bad token"}"#.into()),
        };
        match err {
            GatewayError::Provider { status, body, .. } => {
                assert_eq!(status, Some(401));
                assert!(body.unwrap().contains("bad token"));
            }
            _ => panic!("expected provider error"),
        }
    }

    #[test]
    fn flow_error_converts_into_gateway_error() {
        let err: GatewayError = FlowError::NoStartNode("f".into()).into();
        assert!(matches!(err, GatewayError::Flow(_)));
    }
}
