//! Map proxy.

use crate::client::GatewayClient;
use crate::error::{GatewayError, Result};
use crate::protocol::Value;
use crate::proxy::{expect_bool, expect_i32, expect_object, expect_set, ObjectProxy, SetProxy};
use std::collections::HashMap;

/// Handle to a JVM `java.util.Map`.
#[derive(Debug, Clone)]
pub struct MapProxy {
    client: GatewayClient,
    target_id: String,
}

impl MapProxy {
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
        expect_i32(self.invoke("size", &[]).await?, "Map.size")
    }

    pub async fn get(&self, key: Value) -> Result<Value> {
        self.invoke("get", &[key]).await
    }

    /// Associate `key` with `value`; returns the previous value (or null).
    pub async fn put(&self, key: Value, value: Value) -> Result<Value> {
        self.invoke("put", &[key, value]).await
    }

    /// Remove `key`; returns the removed value (or null).
    pub async fn remove(&self, key: Value) -> Result<Value> {
        self.invoke("remove", &[key]).await
    }

    pub async fn contains_key(&self, key: Value) -> Result<bool> {
        expect_bool(self.invoke("containsKey", &[key]).await?, "Map.containsKey")
    }

    pub async fn contains_value(&self, value: Value) -> Result<bool> {
        expect_bool(
            self.invoke("containsValue", &[value]).await?,
            "Map.containsValue",
        )
    }

    pub async fn clear(&self) -> Result<()> {
        self.invoke("clear", &[]).await?;
        Ok(())
    }

    /// The map's key set, as a set proxy.
    pub async fn key_set(&self) -> Result<SetProxy> {
        expect_set(self.invoke("keySet", &[]).await?, "Map.keySet")
    }

    /// The map's value collection.
    ///
    /// The gateway tags a `Collection` as a plain reference, so this is a
    /// generic object proxy rather than a list; materialize through
    /// [`to_pairs`](Self::to_pairs) when local values are needed.
    pub async fn values(&self) -> Result<ObjectProxy> {
        expect_object(self.invoke("values", &[]).await?, "Map.values")
    }

    /// The map's entry set, as a set proxy.
    pub async fn entry_set(&self) -> Result<SetProxy> {
        expect_set(self.invoke("entrySet", &[]).await?, "Map.entrySet")
    }

    /// Materialize as key/value pairs, preserving arbitrary key values.
    pub async fn to_pairs(&self) -> Result<Vec<(Value, Value)>> {
        let entries = self.entry_set().await?;
        let iterator = entries.iterator().await?;
        let mut pairs = Vec::new();
        while iterator.has_next().await? {
            let entry = match iterator.next().await? {
                Value::Object(entry) => entry,
                other => {
                    return Err(GatewayError::Decode(format!(
                        "Map entry is not an object reference: {other:?}"
                    )))
                }
            };
            let key = entry.call("getKey", &[]).await?;
            let value = entry.call("getValue", &[]).await?;
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    /// Materialize as a string-keyed map. Fails when a key is not a
    /// string on the JVM side.
    pub async fn to_string_map(&self) -> Result<HashMap<String, Value>> {
        let mut map = HashMap::new();
        for (key, value) in self.to_pairs().await? {
            match key {
                Value::Str(key) => {
                    map.insert(key, value);
                }
                other => {
                    return Err(GatewayError::UnsupportedType(format!(
                        "map key is not a string: {other:?}"
                    )))
                }
            }
        }
        Ok(map)
    }
}

impl PartialEq for MapProxy {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id
    }
}
