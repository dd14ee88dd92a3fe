//! TCP transport to the JVM gateway.
//!
//! # Architecture
//!
//! - **Connection**: one TCP session with a strict write-one-read-one
//!   discipline and newline framing
//! - **Pool**: a bounded set of connections with a FIFO waiter queue;
//!   exclusive checkout is what serializes commands on a connection

pub mod connection;
pub mod pool;

pub use connection::Connection;
pub use pool::{ConnectionPool, PooledConnection};
