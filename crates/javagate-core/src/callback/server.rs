//! TCP server for inbound JVM callbacks.
//!
//! Listens on the configured callback address, accepts connections from the
//! gateway, and drives each one as a line-accumulating command parser:
//! lines collect until the terminator `e`, then the buffered lines form one
//! command. Commands on a connection run sequentially in arrival order;
//! connections are independent of each other.
//!
//! # Thread Safety
//!
//! Each connection is handled in its own spawned task. The registry is
//! shared via `Arc` and the client handle is used only to decode
//! reference-typed arguments; neither owns the other.

use crate::callback::registry::CallbackRegistry;
use crate::client::GatewayClient;
use crate::error::Result;
use crate::protocol::{self, codec, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info};

/// Handle to a running callback server. Dropping shuts down the server.
pub struct CallbackServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    conn_shutdown_tx: watch::Sender<bool>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl CallbackServerHandle {
    /// The address the server is bound to (with the real port when the
    /// configured port was 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shut down gracefully: stop accepting and signal every connection
    /// handler to close.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.conn_shutdown_tx.send(true);
    }
}

impl Drop for CallbackServerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// Callback server.
pub struct CallbackServer;

impl CallbackServer {
    /// Bind `addr` and start serving in background tasks.
    ///
    /// The client handle is needed to wrap reference-typed arguments the
    /// gateway sends; the registry resolves callback proxy IDs to local
    /// objects.
    pub async fn start(
        client: GatewayClient,
        registry: Arc<CallbackRegistry>,
        addr: SocketAddr,
    ) -> Result<CallbackServerHandle> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        info!("callback server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (conn_shutdown_tx, conn_shutdown_rx) = watch::channel(false);

        let task_handle = tokio::spawn(Self::accept_loop(
            listener,
            client,
            registry,
            shutdown_rx,
            conn_shutdown_rx,
        ));

        Ok(CallbackServerHandle {
            addr,
            shutdown_tx: Some(shutdown_tx),
            conn_shutdown_tx,
            task_handle: Some(task_handle),
        })
    }

    async fn accept_loop(
        listener: TcpListener,
        client: GatewayClient,
        registry: Arc<CallbackRegistry>,
        mut shutdown_rx: oneshot::Receiver<()>,
        conn_shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("callback server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            let client = client.clone();
                            let registry = registry.clone();
                            let mut conn_shutdown = conn_shutdown_rx.clone();
                            tokio::spawn(async move {
                                debug!("callback connection from {}", peer_addr);
                                if let Err(e) = Self::handle_connection(
                                    stream,
                                    &client,
                                    &registry,
                                    &mut conn_shutdown,
                                )
                                .await
                                {
                                    debug!("callback connection {} ended: {}", peer_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("callback accept error: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        client: &GatewayClient,
        registry: &CallbackRegistry,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let mut command: Vec<String> = Vec::new();

        loop {
            let line = tokio::select! {
                result = lines.next_line() => {
                    match result? {
                        Some(line) => line,
                        None => return Ok(()), // Clean disconnect
                    }
                }
                _ = shutdown_rx.changed() => {
                    return Ok(()); // Server shutting down
                }
            };

            if line != protocol::END {
                command.push(line);
                continue;
            }

            let reply = Self::process_command(&command, client, registry).await;
            command.clear();
            write_half.write_all(reply.as_bytes()).await?;
            write_half.flush().await?;
        }
    }

    /// Run one accumulated command and produce the reply line.
    async fn process_command(
        lines: &[String],
        client: &GatewayClient,
        registry: &CallbackRegistry,
    ) -> String {
        match lines.first().map(String::as_str) {
            Some(line) if line == protocol::CALL_COMMAND => {
                Self::process_call(&lines[1..], client, registry).await
            }
            Some(line) if line == protocol::CALLBACK_COLLECT_COMMAND => {
                match lines.get(1) {
                    Some(id) => {
                        registry.remove(id);
                        debug!("callback proxy {} collected", id);
                        success_reply(&Value::Null, registry)
                    }
                    None => error_reply("collect command is missing a proxy id"),
                }
            }
            Some(other) => error_reply(&format!("unknown callback command {other:?}")),
            None => error_reply("empty callback command"),
        }
    }

    async fn process_call(
        lines: &[String],
        client: &GatewayClient,
        registry: &CallbackRegistry,
    ) -> String {
        let (id, method) = match (lines.first(), lines.get(1)) {
            (Some(id), Some(method)) => (id, method),
            _ => return error_reply("call command is missing a proxy id or method"),
        };

        let Some((object, _)) = registry.lookup(id) else {
            return error_reply(&format!("no such callback proxy: {id}"));
        };

        let mut args = Vec::with_capacity(lines.len() - 2);
        for raw in &lines[2..] {
            match codec::decode_value(raw, client) {
                Ok(value) => args.push(value),
                Err(e) => return error_reply(&format!("bad argument {raw:?}: {e}")),
            }
        }

        debug!("callback invoke {}.{}({} args)", id, method, args.len());
        match object.invoke(method, args).await {
            Ok(value) => success_reply(&value, registry),
            Err(e) => error_reply(&e.to_string()),
        }
    }
}

/// `!y` + encoded value; null results use the void tag.
fn success_reply(value: &Value, registry: &CallbackRegistry) -> String {
    if value.is_null() {
        return format!("!{}{}\n", protocol::SUCCESS, protocol::VOID_TYPE);
    }
    match codec::encode_part(value, registry) {
        // The encoded part already ends with the newline.
        Ok(part) => format!("!{}{}", protocol::SUCCESS, part),
        Err(e) => error_reply(&e.to_string()),
    }
}

/// `!x` + message, with any newlines flattened so the reply stays one line.
fn error_reply(message: &str) -> String {
    let message = message.replace('\n', " ");
    format!("!{}{}\n", protocol::ERROR, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::error::GatewayError;

    struct Doubler;

    #[async_trait::async_trait]
    impl crate::callback::CallbackObject for Doubler {
        async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
            match method {
                "double" => {
                    let n = args[0].as_i32().unwrap_or(0);
                    Ok(Value::Int(n * 2))
                }
                "boom" => Err(GatewayError::Usage("told to fail".to_string())),
                _ => Err(GatewayError::Usage(format!("unknown method {method}"))),
            }
        }
    }

    fn test_client() -> (GatewayClient, Arc<CallbackRegistry>) {
        let client = GatewayClient::new(GatewayConfig::default());
        let registry = client.registry().clone();
        (client, registry)
    }

    #[tokio::test]
    async fn test_call_dispatch() {
        let (client, registry) = test_client();
        let id = registry.register(Arc::new(Doubler), vec![]);

        let lines = vec![id, "double".to_string(), "i21".to_string()];
        let reply = CallbackServer::process_call(&lines, &client, &registry).await;
        assert_eq!(reply, "!yi42\n");
    }

    #[tokio::test]
    async fn test_call_unknown_proxy() {
        let (client, registry) = test_client();
        let lines = vec!["p404".to_string(), "double".to_string()];
        let reply = CallbackServer::process_call(&lines, &client, &registry).await;
        assert!(reply.starts_with("!x"));
        assert!(reply.contains("p404"));
    }

    #[tokio::test]
    async fn test_invocation_error_is_reported() {
        let (client, registry) = test_client();
        let id = registry.register(Arc::new(Doubler), vec![]);

        let lines = vec![id, "boom".to_string()];
        let reply = CallbackServer::process_call(&lines, &client, &registry).await;
        assert!(reply.starts_with("!x"));
        assert!(reply.contains("told to fail"));
        assert!(!reply.trim_end_matches('\n').contains('\n'));
    }

    #[tokio::test]
    async fn test_collect_command_removes_registration() {
        let (client, registry) = test_client();
        let id = registry.register(Arc::new(Doubler), vec![]);
        assert!(registry.contains(&id));

        let lines = vec!["g".to_string(), id.clone()];
        let reply = CallbackServer::process_command(&lines, &client, &registry).await;
        assert_eq!(reply, "!yv\n");
        assert!(!registry.contains(&id));
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_going() {
        let (client, registry) = test_client();
        let lines = vec!["q".to_string()];
        let reply = CallbackServer::process_command(&lines, &client, &registry).await;
        assert!(reply.starts_with("!x"));
    }

    #[tokio::test]
    async fn test_ephemeral_port_is_captured() {
        let (client, registry) = test_client();
        let mut handle =
            CallbackServer::start(client, registry, "127.0.0.1:0".parse().unwrap())
                .await
                .unwrap();
        assert_ne!(handle.addr().port(), 0);
        handle.shutdown();
    }
}
