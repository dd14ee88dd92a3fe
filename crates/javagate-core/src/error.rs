//! Error types for the gateway bridge.
//!
//! This module defines the error taxonomy for everything the crate does:
//! transport failures, the authentication handshake, Java-side invocation
//! errors, protocol violations, and local misuse of the API.

use crate::proxy::ObjectProxy;
use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failed: connect error, connection lost, empty response,
    /// or a write failure mid-command.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The authentication handshake did not yield a success code.
    #[error("Gateway authentication failed")]
    Authentication,

    /// The Java side raised an exception while executing a command.
    ///
    /// `payload` is the raw error payload from the wire; `exception` is the
    /// best-effort decoded proxy for the Java exception object, when the
    /// gateway sent a reference.
    #[error("Java invocation error: {payload}")]
    HostInvocation {
        payload: String,
        exception: Option<ObjectProxy>,
    },

    /// The gateway reported a fatal protocol condition.
    #[error("Fatal gateway error: {0}")]
    FatalProtocol(String),

    /// A response line did not match the protocol framing rules.
    #[error("Protocol framing error: {0}")]
    Framing(String),

    /// A value payload carried an unknown type tag, a bad escape sequence,
    /// or an unparseable number.
    #[error("Protocol decode error: {0}")]
    Decode(String),

    /// The encoder was handed a value it refuses to convert.
    #[error("Unsupported value: {0}")]
    UnsupportedType(String),

    /// The API was used in a way the protocol cannot express.
    #[error("Usage error: {0}")]
    Usage(String),
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl GatewayError {
    /// Create a network error from a plain message.
    pub fn network(message: impl Into<String>) -> Self {
        GatewayError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// True for transport-level failures.
    ///
    /// Best-effort operations (object release, gateway shutdown) swallow
    /// these; everything else propagates.
    pub fn is_network(&self) -> bool {
        matches!(self, GatewayError::Network { .. })
    }

    /// The decoded Java exception proxy, if this is a host invocation error
    /// that carried one.
    pub fn host_exception(&self) -> Option<&ObjectProxy> {
        match self {
            GatewayError::HostInvocation { exception, .. } => exception.as_ref(),
            _ => None,
        }
    }
}
