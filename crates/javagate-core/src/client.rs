//! High-level gateway client.
//!
//! `GatewayClient` builds protocol commands, dispatches them through the
//! connection pool, and decodes the single response line each command
//! produces. It also owns the callback registry shared with the inbound
//! callback server, and wraps reference-typed results into the proxy kind
//! the gateway tagged.
//!
//! Construction performs no I/O; the pool dials lazily on the first
//! command.

use crate::callback::{CallbackRegistry, CallbackServer, CallbackServerHandle};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::ipc::ConnectionPool;
use crate::protocol::{self, codec, CallbackRef, Value};
use crate::proxy::{
    ArrayProxy, IteratorProxy, JvmView, ListProxy, MapProxy, ObjectProxy, SetProxy,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Client for a Py4J-compatible JVM gateway.
///
/// Cheap to clone; all clones share the connection pool and the callback
/// registry.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: GatewayConfig,
    pool: ConnectionPool,
    registry: Arc<CallbackRegistry>,
    callback_server: Mutex<Option<CallbackServerHandle>>,
}

impl GatewayClient {
    /// Create a client for the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let pool = ConnectionPool::new(config.clone());
        Self {
            inner: Arc::new(ClientInner {
                config,
                pool,
                registry: Arc::new(CallbackRegistry::new()),
                callback_server: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Registry of local objects reachable from the JVM.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.inner.registry
    }

    /// Proxy for the gateway's entry-point object.
    pub fn entry_point(&self) -> ObjectProxy {
        ObjectProxy::new(self.clone(), protocol::ENTRY_POINT_TARGET)
    }

    /// The default JVM namespace view.
    pub fn jvm_view(&self) -> JvmView {
        JvmView::new(self.clone(), protocol::DEFAULT_JVM_VIEW)
    }

    /// Create a fresh, independently scoped JVM view.
    pub async fn new_jvm_view(&self, name: &str) -> Result<JvmView> {
        protocol::validate_identifier("view name", name)?;
        let value = self
            .execute(
                &[
                    protocol::JVM_VIEW_COMMAND,
                    protocol::VIEW_CREATE_SUBCOMMAND,
                    name,
                ],
                &[],
            )
            .await?;
        match value.target_id() {
            Some(id) => Ok(JvmView::new(self.clone(), id)),
            None => Err(GatewayError::Decode(format!(
                "view creation did not return a reference: {value:?}"
            ))),
        }
    }

    /// Invoke a method on a gateway object (or statically, when
    /// `target_id` carries the `z:` prefix).
    pub async fn call_method(
        &self,
        target_id: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Value> {
        protocol::validate_identifier("target ID", target_id)?;
        protocol::validate_identifier("method name", method)?;
        self.execute(&[protocol::CALL_COMMAND, target_id, method], args)
            .await
    }

    /// Construct an instance of `class_fqn`.
    pub async fn call_constructor(&self, class_fqn: &str, args: &[Value]) -> Result<Value> {
        protocol::validate_identifier("class name", class_fqn)?;
        self.execute(&[protocol::CONSTRUCTOR_COMMAND, class_fqn], args)
            .await
    }

    /// Read a field. Static targets (`z:` prefix) route through the
    /// reflection get-member command.
    pub async fn get_field(&self, target_id: &str, field: &str) -> Result<Value> {
        protocol::validate_identifier("target ID", target_id)?;
        protocol::validate_identifier("field name", field)?;
        if let Some(fqn) = target_id.strip_prefix(protocol::STATIC_PREFIX) {
            self.execute(
                &[
                    protocol::REFLECTION_COMMAND,
                    protocol::REFLECTION_MEMBER_SUBCOMMAND,
                    fqn,
                    field,
                ],
                &[],
            )
            .await
        } else {
            self.execute(
                &[
                    protocol::FIELD_COMMAND,
                    protocol::FIELD_GET_SUBCOMMAND,
                    target_id,
                    field,
                ],
                &[],
            )
            .await
        }
    }

    /// Write a field on a gateway object.
    pub async fn set_field(&self, target_id: &str, field: &str, value: &Value) -> Result<()> {
        protocol::validate_identifier("target ID", target_id)?;
        protocol::validate_identifier("field name", field)?;
        self.execute(
            &[
                protocol::FIELD_COMMAND,
                protocol::FIELD_SET_SUBCOMMAND,
                target_id,
                field,
            ],
            std::slice::from_ref(value),
        )
        .await?;
        Ok(())
    }

    /// Ask the gateway to drop its reference to an object. Best effort:
    /// transport failures are swallowed (the JVM may already have collected
    /// the object or gone away).
    pub async fn release_object(&self, target_id: &str) -> Result<()> {
        protocol::validate_identifier("target ID", target_id)?;
        let result = self
            .execute(
                &[
                    protocol::MEMORY_COMMAND,
                    protocol::MEMORY_DELETE_SUBCOMMAND,
                    target_id,
                ],
                &[],
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_network() => {
                debug!("release of {} failed: {}", target_id, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Names of the methods on a gateway object.
    pub async fn get_methods(&self, target_id: &str) -> Result<Vec<String>> {
        self.member_listing(protocol::DIR_METHODS_SUBCOMMAND, target_id)
            .await
    }

    /// Names of the fields on a gateway object.
    pub async fn get_fields(&self, target_id: &str) -> Result<Vec<String>> {
        self.member_listing(protocol::DIR_FIELDS_SUBCOMMAND, target_id)
            .await
    }

    /// Names of the static members of a class.
    pub async fn get_static_members(&self, class_fqn: &str) -> Result<Vec<String>> {
        self.member_listing(protocol::DIR_STATIC_SUBCOMMAND, class_fqn)
            .await
    }

    /// Gateway-rendered help text for an object.
    pub async fn help_object(&self, target_id: &str, pattern: Option<&str>) -> Result<String> {
        self.help(protocol::HELP_OBJECT_SUBCOMMAND, target_id, pattern)
            .await
    }

    /// Gateway-rendered help text for a class.
    pub async fn help_class(&self, class_fqn: &str, pattern: Option<&str>) -> Result<String> {
        self.help(protocol::HELP_CLASS_SUBCOMMAND, class_fqn, pattern)
            .await
    }

    /// Create a Java array of `class_fqn` with the given dimensions.
    pub async fn new_array(&self, class_fqn: &str, dimensions: &[i32]) -> Result<ArrayProxy> {
        protocol::validate_identifier("class name", class_fqn)?;
        if dimensions.is_empty() {
            return Err(GatewayError::Usage(
                "array creation requires at least one dimension".to_string(),
            ));
        }
        let mut args = Vec::with_capacity(dimensions.len() + 1);
        args.push(Value::Str(class_fqn.to_string()));
        args.extend(dimensions.iter().map(|d| Value::Int(*d)));
        let value = self
            .execute(
                &[protocol::ARRAY_COMMAND, protocol::ARRAY_CREATE_SUBCOMMAND],
                &args,
            )
            .await?;
        match value {
            Value::Array(array) => Ok(array),
            other => Err(GatewayError::Decode(format!(
                "array creation did not return an array reference: {other:?}"
            ))),
        }
    }

    /// Ask the gateway process to shut down. Best effort.
    pub async fn shutdown_gateway(&self) -> Result<()> {
        let result = self.execute(&[protocol::SHUTDOWN_COMMAND], &[]).await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_network() => {
                debug!("gateway shutdown handshake cut short: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Close idle connections and stop the callback server. In-flight
    /// commands finish on their own connections, which are then discarded.
    pub fn close(&self) {
        self.inner.pool.close_all();
        if let Some(mut handle) = self.inner.callback_server.lock().unwrap().take() {
            handle.shutdown();
        }
    }

    /// Send the gateway shutdown command, then [`close`](Self::close).
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_gateway().await?;
        self.close();
        Ok(())
    }

    /// Start the inbound callback server on the configured bind address
    /// and return the actual bound address.
    pub async fn start_callback_server(&self) -> Result<SocketAddr> {
        {
            let guard = self.inner.callback_server.lock().unwrap();
            if let Some(handle) = guard.as_ref() {
                return Err(GatewayError::Usage(format!(
                    "callback server already running on {}",
                    handle.addr()
                )));
            }
        }
        let handle = CallbackServer::start(
            self.clone(),
            self.inner.registry.clone(),
            self.inner.config.callback_address,
        )
        .await?;
        let addr = handle.addr();
        *self.inner.callback_server.lock().unwrap() = Some(handle);
        Ok(addr)
    }

    /// Bound address of the callback server, if running.
    pub fn callback_server_addr(&self) -> Option<SocketAddr> {
        self.inner
            .callback_server
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| h.addr())
    }

    /// Wrap a gateway reference into the proxy kind its type tag names.
    ///
    /// Unknown tags fall back to the generic object proxy.
    pub fn wrap(&self, target_id: &str, tag: char) -> Value {
        match tag {
            protocol::LIST_TYPE => Value::List(ListProxy::new(self.clone(), target_id)),
            protocol::SET_TYPE => Value::Set(SetProxy::new(self.clone(), target_id)),
            protocol::MAP_TYPE => Value::Map(MapProxy::new(self.clone(), target_id)),
            protocol::ARRAY_TYPE => Value::Array(ArrayProxy::new(self.clone(), target_id)),
            protocol::ITERATOR_TYPE => {
                Value::Iterator(IteratorProxy::new(self.clone(), target_id))
            }
            _ => Value::Object(ObjectProxy::new(self.clone(), target_id)),
        }
    }

    /// Resolve a callback-proxy ID to the locally registered object, or
    /// null when it is no longer registered.
    pub fn lookup_proxy(&self, id: &str) -> Value {
        // The wire form is `<id>;<interfaces>`; only the ID resolves.
        let id = id.split(';').next().unwrap_or(id);
        match self.inner.registry.lookup(id) {
            Some((object, interfaces)) => Value::Callback(CallbackRef { object, interfaces }),
            None => Value::Null,
        }
    }

    /// Build a command and run it through the pool.
    pub(crate) async fn execute(&self, header: &[&str], args: &[Value]) -> Result<Value> {
        let command = self.build_command(header, args)?;
        let line = self.inner.pool.send(&command).await?;
        codec::decode_response(&line, self)
    }

    fn build_command(&self, header: &[&str], args: &[Value]) -> Result<String> {
        let mut command = String::new();
        for part in header {
            protocol::validate_identifier("command token", part)?;
            command.push_str(part);
            command.push('\n');
        }
        for arg in args {
            command.push_str(&codec::encode_part(arg, &self.inner.registry)?);
        }
        command.push_str(protocol::END_PART);
        Ok(command)
    }

    async fn member_listing(&self, subcommand: &str, target_id: &str) -> Result<Vec<String>> {
        protocol::validate_identifier("target ID", target_id)?;
        let value = self
            .execute(&[protocol::DIR_COMMAND, subcommand, target_id], &[])
            .await?;
        match value {
            Value::Str(joined) => Ok(joined
                .split('\n')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()),
            other => Err(GatewayError::Decode(format!(
                "expected member listing, got {other:?}"
            ))),
        }
    }

    async fn help(
        &self,
        subcommand: &str,
        target_id: &str,
        pattern: Option<&str>,
    ) -> Result<String> {
        protocol::validate_identifier("target ID", target_id)?;
        let mut header = vec![protocol::HELP_COMMAND, subcommand, target_id];
        if let Some(pattern) = pattern {
            protocol::validate_identifier("help pattern", pattern)?;
            header.push(pattern);
        }
        let value = self.execute(&header, &[]).await?;
        match value {
            Value::Str(text) => Ok(text),
            other => Err(GatewayError::Decode(format!(
                "expected help text, got {other:?}"
            ))),
        }
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("address", &self.inner.config.address)
            .field("pool", &self.inner.pool)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GatewayClient {
        GatewayClient::new(GatewayConfig::default())
    }

    #[test]
    fn test_call_command_shape() {
        let c = client();
        let cmd = c
            .build_command(&["c", "t", "add"], &[Value::Int(3), Value::Int(4)])
            .unwrap();
        assert_eq!(cmd, "c\nt\nadd\ni3\ni4\ne\n");
    }

    #[test]
    fn test_constructor_command_shape() {
        let c = client();
        let cmd = c
            .build_command(
                &["i", "java.lang.StringBuilder"],
                &[Value::Str("hi".into())],
            )
            .unwrap();
        assert_eq!(cmd, "i\njava.lang.StringBuilder\nshi\ne\n");
    }

    #[test]
    fn test_static_field_routes_through_reflection() {
        let c = client();
        // Mirrors the header get_field builds for a z:-prefixed target.
        let cmd = c
            .build_command(&["r", "m", "java.lang.Math", "PI"], &[])
            .unwrap();
        assert_eq!(cmd, "r\nm\njava.lang.Math\nPI\ne\n");
    }

    #[test]
    fn test_newline_in_identifier_is_refused() {
        let c = client();
        let err = c.build_command(&["c", "t", "bad\nname"], &[]).unwrap_err();
        assert!(matches!(err, GatewayError::Usage(_)));
    }

    #[test]
    fn test_wrap_dispatches_on_tag() {
        let c = client();
        assert!(matches!(c.wrap("o1", 'r'), Value::Object(_)));
        assert!(matches!(c.wrap("o1", 'l'), Value::List(_)));
        assert!(matches!(c.wrap("o1", 'h'), Value::Set(_)));
        assert!(matches!(c.wrap("o1", 'a'), Value::Map(_)));
        assert!(matches!(c.wrap("o1", 't'), Value::Array(_)));
        assert!(matches!(c.wrap("o1", 'g'), Value::Iterator(_)));
        // Unknown tags become generic object proxies.
        assert!(matches!(c.wrap("o1", '?'), Value::Object(_)));
    }

    #[test]
    fn test_lookup_proxy_missing_is_null() {
        let c = client();
        assert_eq!(c.lookup_proxy("p99"), Value::Null);
    }

    #[test]
    fn test_entry_point_and_view_ids() {
        let c = client();
        assert_eq!(c.entry_point().target_id(), "t");
        assert_eq!(c.jvm_view().id(), "rj");
    }
}
