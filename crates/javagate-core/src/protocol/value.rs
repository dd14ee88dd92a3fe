//! The tagged value union exchanged with the gateway.
//!
//! Every argument sent to the JVM and every decoded response is a [`Value`].
//! Reference-typed values carry a proxy of the exact kind the gateway
//! tagged; the client never upgrades or downgrades a kind on its own.

use crate::callback::CallbackObject;
use crate::proxy::{ArrayProxy, IteratorProxy, ListProxy, MapProxy, ObjectProxy, SetProxy};
use std::fmt;
use std::sync::Arc;

/// A local object offered to the JVM as an implementation of one or more
/// Java interfaces.
///
/// Passing a `CallbackRef` as a call argument registers the object in the
/// callback registry (assigning it a stable `p<n>` ID) and sends the JVM a
/// proxy handle; the JVM then invokes methods on it over the callback
/// channel.
#[derive(Clone)]
pub struct CallbackRef {
    /// The local implementation.
    pub object: Arc<dyn CallbackObject>,
    /// Fully-qualified names of the Java interfaces the object implements.
    pub interfaces: Vec<String>,
}

impl CallbackRef {
    /// Create a callback reference for `object` implementing `interfaces`.
    pub fn new(
        object: Arc<dyn CallbackObject>,
        interfaces: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            object,
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Debug for CallbackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRef")
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CallbackRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object) && self.interfaces == other.interfaces
    }
}

/// A value on the gateway wire.
#[derive(Debug, Clone)]
pub enum Value {
    /// Java `null`, and the result of `void` methods.
    Null,
    Bool(bool),
    /// Fits the signed 32-bit range; wire tag `i`.
    Int(i32),
    /// Wire tag `L` (or `i` when the value happens to fit 32 bits).
    Long(i64),
    Double(f64),
    /// Arbitrary-precision decimal, kept in its textual form.
    Decimal(String),
    Str(String),
    Bytes(Vec<u8>),
    /// Generic object reference.
    Object(ObjectProxy),
    List(ListProxy),
    Set(SetProxy),
    Map(MapProxy),
    Array(ArrayProxy),
    Iterator(IteratorProxy),
    /// A local object registered (or about to be registered) for JVM
    /// callbacks.
    Callback(CallbackRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Long(n) => i32::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectProxy> {
        match self {
            Value::Object(p) => Some(p),
            _ => None,
        }
    }

    /// Target ID of the referenced JVM object, for any reference-typed
    /// variant.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Value::Object(p) => Some(p.target_id()),
            Value::List(p) => Some(p.target_id()),
            Value::Set(p) => Some(p.target_id()),
            Value::Map(p) => Some(p.target_id()),
            Value::Array(p) => Some(p.target_id()),
            Value::Iterator(p) => Some(p.target_id()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Callback(a), Value::Callback(b)) => a == b,
            // Reference kinds compare by identity on the JVM side.
            _ => match (self.target_id(), other.target_id()) {
                (Some(a), Some(b)) => {
                    a == b && std::mem::discriminant(self) == std::mem::discriminant(other)
                }
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<CallbackRef> for Value {
    fn from(cb: CallbackRef) -> Self {
        Value::Callback(cb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_accessors() {
        assert_eq!(Value::Int(7).as_i32(), Some(7));
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Long(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::Long(1 << 40).as_i32(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Str("x".into()).as_str(), Some("x"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Null.as_i32(), None);
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from(3i64), Value::Long(3));
        assert_eq!(Value::from("hi"), Value::Str("hi".into()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
    }

    #[test]
    fn test_equality_is_variant_strict() {
        // Int(3) and Long(3) are distinct wire types.
        assert_ne!(Value::Int(3), Value::Long(3));
        assert_eq!(Value::Decimal("1.50".into()), Value::Decimal("1.50".into()));
        assert_ne!(Value::Decimal("1.5".into()), Value::Decimal("1.50".into()));
    }
}
