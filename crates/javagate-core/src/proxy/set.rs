//! Set proxy.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::protocol::Value;
use crate::proxy::{expect_bool, expect_i32, expect_iterator, IteratorProxy};

/// Handle to a JVM `java.util.Set`.
///
/// Sets have no indexed access; enumeration goes through a host iterator.
#[derive(Debug, Clone)]
pub struct SetProxy {
    client: GatewayClient,
    target_id: String,
}

impl SetProxy {
    pub(crate) fn new(client: GatewayClient, target_id: impl Into<String>) -> Self {
        Self {
            client,
            target_id: target_id.into(),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    async fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.client.call_method(&self.target_id, method, args).await
    }

    pub async fn size(&self) -> Result<i32> {
        expect_i32(self.invoke("size", &[]).await?, "Set.size")
    }

    /// Add an element; true when the set did not already contain it.
    pub async fn add(&self, element: Value) -> Result<bool> {
        expect_bool(self.invoke("add", &[element]).await?, "Set.add")
    }

    /// Remove an element; true when it was present.
    pub async fn remove(&self, element: Value) -> Result<bool> {
        expect_bool(self.invoke("remove", &[element]).await?, "Set.remove")
    }

    pub async fn contains(&self, element: Value) -> Result<bool> {
        expect_bool(self.invoke("contains", &[element]).await?, "Set.contains")
    }

    pub async fn clear(&self) -> Result<()> {
        self.invoke("clear", &[]).await?;
        Ok(())
    }

    /// A host iterator over the set.
    pub async fn iterator(&self) -> Result<IteratorProxy> {
        expect_iterator(self.invoke("iterator", &[]).await?, "Set.iterator")
    }

    /// Materialize the set locally. The host guarantees uniqueness; order
    /// is whatever its iterator yields.
    pub async fn to_vec(&self) -> Result<Vec<Value>> {
        self.iterator().await?.collect_remaining().await
    }
}

impl PartialEq for SetProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id
    }
}
