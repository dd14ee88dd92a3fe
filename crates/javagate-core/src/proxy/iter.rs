//! Iterator proxy.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::protocol::Value;
use crate::proxy::expect_bool;

/// Handle to a JVM `java.util.Iterator`.
#[derive(Debug, Clone)]
pub struct IteratorProxy {
    client: GatewayClient,
    target_id: String,
}

impl IteratorProxy {
    pub(crate) fn new(client: GatewayClient, target_id: impl Into<String>) -> Self {
        Self {
            client,
            target_id: target_id.into(),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub async fn has_next(&self) -> Result<bool> {
        expect_bool(
            self.client.call_method(&self.target_id, "hasNext", &[]).await?,
            "Iterator.hasNext",
        )
    }

    pub async fn next(&self) -> Result<Value> {
        self.client.call_method(&self.target_id, "next", &[]).await
    }

    /// Remove the element last returned by [`next`](Self::next).
    pub async fn remove(&self) -> Result<()> {
        self.client.call_method(&self.target_id, "remove", &[]).await?;
        Ok(())
    }

    /// Drain the iterator into a local vector.
    pub async fn collect_remaining(&self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        while self.has_next().await? {
            items.push(self.next().await?);
        }
        Ok(items)
    }
}

impl PartialEq for IteratorProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id
    }
}
