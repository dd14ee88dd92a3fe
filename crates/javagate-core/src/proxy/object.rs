//! Generic object proxy.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::protocol::Value;

/// Handle to an arbitrary JVM object.
///
/// Method and field access are explicit operations; there is no implicit
/// name-to-call mapping. Field writes go through [`set_field`](Self::set_field)
/// — the protocol has no assignment form.
#[derive(Debug, Clone)]
pub struct ObjectProxy {
    client: GatewayClient,
    target_id: String,
}

impl ObjectProxy {
    pub(crate) fn new(client: GatewayClient, target_id: impl Into<String>) -> Self {
        Self {
            client,
            target_id: target_id.into(),
        }
    }

    /// The gateway-issued target ID. Never changes after construction.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Invoke a method on the remote object.
    pub async fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.client.call_method(&self.target_id, method, args).await
    }

    /// Read a field of the remote object.
    pub async fn field(&self, name: &str) -> Result<Value> {
        self.client.get_field(&self.target_id, name).await
    }

    /// Write a field of the remote object.
    pub async fn set_field(&self, name: &str, value: &Value) -> Result<()> {
        self.client.set_field(&self.target_id, name, value).await
    }

    /// Names of the object's methods.
    pub async fn methods(&self) -> Result<Vec<String>> {
        self.client.get_methods(&self.target_id).await
    }

    /// Names of the object's fields.
    pub async fn fields(&self) -> Result<Vec<String>> {
        self.client.get_fields(&self.target_id).await
    }

    /// Gateway-rendered help text, optionally filtered by pattern.
    pub async fn help(&self, pattern: Option<&str>) -> Result<String> {
        self.client.help_object(&self.target_id, pattern).await
    }

    /// Release the gateway's reference to this object. Best effort.
    pub async fn release(&self) -> Result<()> {
        self.client.release_object(&self.target_id).await
    }
}

impl PartialEq for ObjectProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id
    }
}
