//! Array proxy.
//!
//! Java arrays are not objects with methods, so every operation here uses
//! the dedicated array subcommand protocol instead of the generic call
//! path. Arrays are created with [`GatewayClient::new_array`].
//!
//! [`GatewayClient::new_array`]: crate::client::GatewayClient::new_array

use crate::client::GatewayClient;
use crate::error::Result;
use crate::protocol::{self, Value};
use crate::proxy::{expect_array, expect_i32};

/// Handle to a JVM array.
#[derive(Debug, Clone)]
pub struct ArrayProxy {
    client: GatewayClient,
    target_id: String,
}

impl ArrayProxy {
    pub(crate) fn new(client: GatewayClient, target_id: impl Into<String>) -> Self {
        Self {
            client,
            target_id: target_id.into(),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    async fn subcommand(&self, sub: &str, args: &[Value]) -> Result<Value> {
        self.client
            .execute(&[protocol::ARRAY_COMMAND, sub, &self.target_id], args)
            .await
    }

    /// Element at `index`.
    pub async fn get(&self, index: i32) -> Result<Value> {
        self.subcommand(protocol::ARRAY_GET_SUBCOMMAND, &[Value::Int(index)])
            .await
    }

    /// Store `element` at `index`.
    pub async fn set(&self, index: i32, element: Value) -> Result<()> {
        self.subcommand(protocol::ARRAY_SET_SUBCOMMAND, &[Value::Int(index), element])
            .await?;
        Ok(())
    }

    /// The array length.
    pub async fn length(&self) -> Result<i32> {
        let value = self
            .subcommand(protocol::ARRAY_LEN_SUBCOMMAND, &[])
            .await?;
        expect_i32(value, "Array.length")
    }

    /// A new gateway array holding elements `[from, to)`.
    pub async fn slice(&self, from: i32, to: i32) -> Result<ArrayProxy> {
        let value = self
            .subcommand(
                protocol::ARRAY_SLICE_SUBCOMMAND,
                &[Value::Int(from), Value::Int(to)],
            )
            .await?;
        expect_array(value, "Array.slice")
    }

    /// Materialize the array locally, one `get` per element.
    pub async fn to_vec(&self) -> Result<Vec<Value>> {
        let length = self.length().await?;
        let mut items = Vec::with_capacity(length.max(0) as usize);
        for index in 0..length {
            items.push(self.get(index).await?);
        }
        Ok(items)
    }
}

impl PartialEq for ArrayProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id
    }
}
