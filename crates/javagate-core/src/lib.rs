//! JavaGate Core - Client bridge to a Py4J-compatible JVM gateway.
//!
//! This crate connects to a long-running JVM gateway process over TCP and
//! exposes Java objects, classes, packages, collections, and arrays as
//! lazily-proxied asynchronous handles. It also operates in reverse: local
//! Rust objects can be registered as implementations of Java interfaces,
//! and the JVM calls back into them over a second TCP channel.
//!
//! Launching the JVM process itself is out of scope — the gateway is
//! expected to be running already.
//!
//! # Example
//!
//! ```rust,ignore
//! use javagate_core::{GatewayClient, GatewayConfig, Value};
//!
//! #[tokio::main]
//! async fn main() -> javagate_core::Result<()> {
//!     let client = GatewayClient::new(GatewayConfig::default());
//!
//!     // Call a method on the gateway's entry point
//!     let sum = client
//!         .entry_point()
//!         .call("add", &[Value::Int(3), Value::Int(4)])
//!         .await?;
//!     println!("3 + 4 = {:?}", sum);
//!
//!     // Static call through the JVM namespace
//!     let math = client.jvm_view().class("java.lang.Math");
//!     let abs = math.call("abs", &[Value::Int(-5)]).await?;
//!     println!("abs(-5) = {:?}", abs);
//!
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod ipc;
pub mod protocol;
pub mod proxy;

// Re-export commonly used types
pub use callback::{CallbackObject, CallbackRegistry, CallbackServer, CallbackServerHandle};
pub use client::GatewayClient;
pub use config::{GatewayConfig, GatewayDefaults};
pub use error::{GatewayError, Result};
pub use protocol::{CallbackRef, Value};
pub use proxy::{
    ArrayProxy, ClassProxy, IteratorProxy, JvmMember, JvmView, ListProxy, MapProxy, ObjectProxy,
    PackageProxy, SetProxy,
};
