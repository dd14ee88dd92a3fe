//! A single TCP session with the gateway.
//!
//! The protocol forbids pipelining: at most one command is in flight per
//! connection, and the next write must not begin until exactly one
//! newline-terminated response line has been read. Exclusive ownership
//! (`&mut self` on [`Connection::send`], enforced pool checkout above)
//! provides that discipline.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::protocol;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

/// One gateway connection.
///
/// The buffered reader keeps any bytes that arrive past the response
/// newline; they are consumed by the next read on this connection.
#[derive(Debug)]
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
    alive: bool,
}

impl Connection {
    /// Open a connection to the configured gateway and complete the
    /// authentication handshake when a token is configured.
    pub async fn connect(config: &GatewayConfig) -> Result<Self> {
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(config.address))
            .await
            .map_err(|_| {
                GatewayError::network(format!("connect to {} timed out", config.address))
            })?
            .map_err(|e| GatewayError::Network {
                message: format!("connect to {} failed", config.address),
                source: Some(e),
            })?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();

        let mut conn = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
            alive: true,
        };

        if let Some(token) = &config.auth_token {
            conn.authenticate(token).await?;
        }

        debug!("gateway connection established to {}", peer);
        Ok(conn)
    }

    /// Send one command and read exactly one response line (without its
    /// trailing newline).
    ///
    /// Any transport error marks the connection dead; the pool discards
    /// dead connections on release.
    pub async fn send(&mut self, command: &str) -> Result<String> {
        if !self.alive {
            return Err(GatewayError::network("connection is closed"));
        }
        match self.send_inner(command).await {
            Ok(line) => Ok(line),
            Err(e) => {
                self.alive = false;
                Err(e)
            }
        }
    }

    async fn send_inner(&mut self, command: &str) -> Result<String> {
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(GatewayError::network("gateway closed the connection"));
        }
        if line.pop() != Some('\n') {
            return Err(GatewayError::network(
                "gateway closed the connection mid-response",
            ));
        }
        Ok(line)
    }

    async fn authenticate(&mut self, token: &str) -> Result<()> {
        protocol::validate_identifier("auth token", token)?;
        let command = format!("{}\n{}\n{}", protocol::AUTH_COMMAND, token, protocol::END_PART);
        let reply = self.send(&command).await?;
        let reply = reply.strip_prefix('!').unwrap_or(&reply);
        if reply.starts_with(protocol::SUCCESS) {
            debug!("gateway connection to {} authenticated", self.peer);
            Ok(())
        } else {
            self.alive = false;
            Err(GatewayError::Authentication)
        }
    }

    /// False once a transport error has been observed.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Address of the gateway peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    async fn one_shot_peer(replies: Vec<&'static str>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();
            let mut replies = replies.into_iter();
            // Reply once per complete command (terminated by "e").
            while let Ok(Some(line)) = lines.next_line().await {
                if line == "e" {
                    match replies.next() {
                        Some(reply) => write_half.write_all(reply.as_bytes()).await.unwrap(),
                        None => break,
                    }
                }
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_send_reads_one_line() {
        let addr = one_shot_peer(vec!["!yi7\n"]).await;
        let config = GatewayConfig::new().with_address(addr);
        let mut conn = Connection::connect(&config).await.unwrap();

        let line = conn.send("c\nt\nadd\ni3\ni4\ne\n").await.unwrap();
        assert_eq!(line, "!yi7");
        assert!(conn.is_alive());
    }

    #[tokio::test]
    async fn test_peer_close_is_network_error() {
        let addr = one_shot_peer(vec![]).await;
        let config = GatewayConfig::new().with_address(addr);
        let mut conn = Connection::connect(&config).await.unwrap();

        let err = conn.send("s\ne\n").await.unwrap_err();
        assert!(err.is_network());
        assert!(!conn.is_alive());

        // Subsequent sends fail fast.
        let err = conn.send("s\ne\n").await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_auth_success() {
        let addr = one_shot_peer(vec!["!yv\n", "!yi1\n"]).await;
        let config = GatewayConfig::new().with_address(addr).with_auth_token("tok");
        let mut conn = Connection::connect(&config).await.unwrap();

        let line = conn.send("c\nt\ngetOne\ne\n").await.unwrap();
        assert_eq!(line, "!yi1");
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let addr = one_shot_peer(vec!["!xsbad token\n"]).await;
        let config = GatewayConfig::new().with_address(addr).with_auth_token("nope");
        let err = Connection::connect(&config).await.unwrap_err();
        assert!(matches!(err, GatewayError::Authentication));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Port 1 is never listening.
        let config = GatewayConfig::new().with_address("127.0.0.1:1".parse().unwrap());
        let err = Connection::connect(&config).await.unwrap_err();
        assert!(err.is_network());
    }
}
