//! List proxy.
//!
//! Most operations map straight onto `java.util.List` methods; sort,
//! reverse, slicing, counting, and the concatenation family use the
//! dedicated list subcommand protocol instead, which works on lists whose
//! element type the generic call path cannot express.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::protocol::{self, Value};
use crate::proxy::{expect_bool, expect_i32, expect_list};

/// Handle to a JVM `java.util.List`.
#[derive(Debug, Clone)]
pub struct ListProxy {
    client: GatewayClient,
    target_id: String,
}

impl ListProxy {
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

    async fn subcommand(&self, sub: &str, args: &[Value]) -> Result<Value> {
        self.client
            .execute(&[protocol::LIST_COMMAND, sub, &self.target_id], args)
            .await
    }

    pub async fn size(&self) -> Result<i32> {
        expect_i32(self.invoke("size", &[]).await?, "List.size")
    }

    pub async fn get(&self, index: i32) -> Result<Value> {
        self.invoke("get", &[Value::Int(index)]).await
    }

    /// Append an element.
    pub async fn add(&self, element: Value) -> Result<()> {
        self.invoke("add", &[element]).await?;
        Ok(())
    }

    /// Insert an element at `index`, shifting the tail.
    pub async fn insert(&self, index: i32, element: Value) -> Result<()> {
        self.invoke("add", &[Value::Int(index), element]).await?;
        Ok(())
    }

    /// Remove the element at `index`; returns the removed element.
    pub async fn remove_at(&self, index: i32) -> Result<Value> {
        self.invoke("remove", &[Value::Int(index)]).await
    }

    /// Remove the first occurrence of `element`; true when found.
    pub async fn remove_value(&self, element: Value) -> Result<bool> {
        expect_bool(self.invoke("remove", &[element]).await?, "List.remove")
    }

    /// Replace the element at `index`; returns the previous element.
    pub async fn set(&self, index: i32, element: Value) -> Result<Value> {
        self.invoke("set", &[Value::Int(index), element]).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.invoke("clear", &[]).await?;
        Ok(())
    }

    pub async fn contains(&self, element: Value) -> Result<bool> {
        expect_bool(self.invoke("contains", &[element]).await?, "List.contains")
    }

    pub async fn index_of(&self, element: Value) -> Result<i32> {
        expect_i32(self.invoke("indexOf", &[element]).await?, "List.indexOf")
    }

    /// Sort in natural order, in place.
    pub async fn sort(&self) -> Result<()> {
        self.subcommand(protocol::LIST_SORT_SUBCOMMAND, &[]).await?;
        Ok(())
    }

    /// Reverse the element order, in place.
    pub async fn reverse(&self) -> Result<()> {
        self.subcommand(protocol::LIST_REVERSE_SUBCOMMAND, &[])
            .await?;
        Ok(())
    }

    /// The sub-list `[from, to)` as a new gateway list.
    pub async fn sub_list(&self, from: i32, to: i32) -> Result<ListProxy> {
        let value = self
            .subcommand(
                protocol::LIST_SLICE_SUBCOMMAND,
                &[Value::Int(from), Value::Int(to)],
            )
            .await?;
        expect_list(value, "List.subList")
    }

    /// Number of occurrences of `element`.
    pub async fn count(&self, element: &Value) -> Result<i32> {
        let value = self
            .subcommand(protocol::LIST_COUNT_SUBCOMMAND, std::slice::from_ref(element))
            .await?;
        expect_i32(value, "List.count")
    }

    /// A new gateway list holding `self` followed by `other`.
    pub async fn concat(&self, other: &ListProxy) -> Result<ListProxy> {
        let value = self
            .subcommand(
                protocol::LIST_CONCAT_SUBCOMMAND,
                &[Value::List(other.clone())],
            )
            .await?;
        expect_list(value, "List.concat")
    }

    /// A new gateway list holding `times` repetitions of `self`.
    pub async fn repeat(&self, times: i32) -> Result<ListProxy> {
        let value = self
            .subcommand(protocol::LIST_MULT_SUBCOMMAND, &[Value::Int(times)])
            .await?;
        expect_list(value, "List.repeat")
    }

    /// Repeat this list's contents `times` times, in place.
    pub async fn repeat_in_place(&self, times: i32) -> Result<()> {
        self.subcommand(protocol::LIST_IMULT_SUBCOMMAND, &[Value::Int(times)])
            .await?;
        Ok(())
    }

    /// Materialize the list locally, in order, one `get` per element.
    pub async fn to_vec(&self) -> Result<Vec<Value>> {
        let size = self.size().await?;
        let mut items = Vec::with_capacity(size.max(0) as usize);
        for index in 0..size {
            items.push(self.get(index).await?);
        }
        Ok(items)
    }
}

impl PartialEq for ListProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id
    }
}
