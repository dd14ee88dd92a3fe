//! Gateway connection configuration.
//!
//! Defaults match the conventional gateway endpoints: outbound commands go
//! to 127.0.0.1:25333 and the inbound callback server binds 127.0.0.1:25334.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Protocol-level defaults.
pub struct GatewayDefaults;

impl GatewayDefaults {
    /// Port the JVM gateway listens on for commands.
    pub const GATEWAY_PORT: u16 = 25333;
    /// Port the local callback server binds by default.
    pub const CALLBACK_PORT: u16 = 25334;
    /// Maximum pooled connections to the gateway.
    pub const MAX_CONNECTIONS: usize = 4;
    /// TCP connect timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default gateway address.
    pub fn gateway_address() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, Self::GATEWAY_PORT))
    }

    /// Default callback bind address.
    pub fn callback_address() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, Self::CALLBACK_PORT))
    }
}

/// Configuration for a gateway client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address of the JVM gateway.
    pub address: SocketAddr,
    /// Optional authentication token sent on every new connection.
    pub auth_token: Option<String>,
    /// Maximum number of pooled connections.
    pub max_connections: usize,
    /// TCP connect timeout for new connections.
    pub connect_timeout: Duration,
    /// Bind address for the inbound callback server. Port 0 means an
    /// ephemeral port, captured after bind.
    pub callback_address: SocketAddr,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: GatewayDefaults::gateway_address(),
            auth_token: None,
            max_connections: GatewayDefaults::MAX_CONNECTIONS,
            connect_timeout: GatewayDefaults::CONNECT_TIMEOUT,
            callback_address: GatewayDefaults::callback_address(),
        }
    }
}

impl GatewayConfig {
    /// Create a config with default endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gateway address.
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Set the authentication token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Set the TCP connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the callback server bind address.
    pub fn with_callback_address(mut self, address: SocketAddr) -> Self {
        self.callback_address = address;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.address.port(), 25333);
        assert_eq!(config.callback_address.port(), 25334);
        assert_eq!(config.max_connections, 4);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = GatewayConfig::new()
            .with_address("10.0.0.1:4000".parse().unwrap())
            .with_auth_token("secret")
            .with_max_connections(8)
            .with_connect_timeout(Duration::from_secs(1));

        assert_eq!(config.address.port(), 4000);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_max_connections_floor() {
        let config = GatewayConfig::new().with_max_connections(0);
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn test_callback_address_override() {
        let config = GatewayConfig::new().with_callback_address("127.0.0.1:0".parse().unwrap());
        assert_eq!(config.callback_address.port(), 0);
    }
}
