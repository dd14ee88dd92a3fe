//! Inbound callback channel.
//!
//! The JVM calls back into this process over a second TCP connection.
//!
//! # Architecture
//!
//! - **Registry**: local objects registered under stable `p<n>` IDs,
//!   shared between the outbound argument encoder and the server
//! - **Server**: accepts gateway connections, parses call commands, and
//!   dispatches them to registered objects

pub mod registry;
pub mod server;

pub use registry::{CallbackObject, CallbackRegistry};
pub use server::{CallbackServer, CallbackServerHandle};
