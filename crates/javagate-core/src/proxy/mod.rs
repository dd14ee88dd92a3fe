//! Proxies for JVM-side objects.
//!
//! Every proxy is a cheap-to-clone handle carrying the client and an opaque
//! target ID issued by the gateway. Operations are remote round-trips; the
//! only local state is the target ID (and, for views, the import shortcut
//! map).
//!
//! Which kind of proxy a value becomes is decided by the gateway's type tag
//! alone — a list reference always decodes to [`ListProxy`], a plain
//! reference to [`ObjectProxy`], and so on.

pub mod array;
pub mod iter;
pub mod list;
pub mod map;
pub mod namespace;
pub mod object;
pub mod set;

pub use array::ArrayProxy;
pub use iter::IteratorProxy;
pub use list::ListProxy;
pub use map::MapProxy;
pub use namespace::{ClassProxy, JvmMember, JvmView, PackageProxy};
pub use object::ObjectProxy;
pub use set::SetProxy;

use crate::error::{GatewayError, Result};
use crate::protocol::Value;

pub(crate) fn expect_i32(value: Value, context: &str) -> Result<i32> {
    value
        .as_i32()
        .ok_or_else(|| GatewayError::Decode(format!("{context}: expected an int, got {value:?}")))
}

pub(crate) fn expect_bool(value: Value, context: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| GatewayError::Decode(format!("{context}: expected a boolean, got {value:?}")))
}

pub(crate) fn expect_list(value: Value, context: &str) -> Result<ListProxy> {
    match value {
        Value::List(list) => Ok(list),
        other => Err(GatewayError::Decode(format!(
            "{context}: expected a list reference, got {other:?}"
        ))),
    }
}

pub(crate) fn expect_set(value: Value, context: &str) -> Result<SetProxy> {
    match value {
        Value::Set(set) => Ok(set),
        other => Err(GatewayError::Decode(format!(
            "{context}: expected a set reference, got {other:?}"
        ))),
    }
}

pub(crate) fn expect_object(value: Value, context: &str) -> Result<ObjectProxy> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(GatewayError::Decode(format!(
            "{context}: expected an object reference, got {other:?}"
        ))),
    }
}

pub(crate) fn expect_iterator(value: Value, context: &str) -> Result<IteratorProxy> {
    match value {
        Value::Iterator(iterator) => Ok(iterator),
        other => Err(GatewayError::Decode(format!(
            "{context}: expected an iterator reference, got {other:?}"
        ))),
    }
}

pub(crate) fn expect_array(value: Value, context: &str) -> Result<ArrayProxy> {
    match value {
        Value::Array(array) => Ok(array),
        other => Err(GatewayError::Decode(format!(
            "{context}: expected an array reference, got {other:?}"
        ))),
    }
}
