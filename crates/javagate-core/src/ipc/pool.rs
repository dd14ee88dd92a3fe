//! Bounded connection pool with a FIFO waiter queue.
//!
//! At most `max_connections` connections exist at any time (checked out +
//! idle). When the pool is exhausted, callers park in arrival order; a
//! release hands the live connection directly to the first waiter,
//! bypassing the idle set. The pool never retries on transport failure —
//! the caller sees the network error.

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::ipc::connection::Connection;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Pool of gateway connections.
pub struct ConnectionPool {
    config: GatewayConfig,
    state: Mutex<PoolState>,
}

struct PoolState {
    idle: Vec<Connection>,
    /// Connections checked out or currently being dialed.
    active: usize,
    waiters: VecDeque<oneshot::Sender<Connection>>,
}

impl ConnectionPool {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                active: 0,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Check out a connection: reuse an idle one, dial a new one below the
    /// cap, or park until a release hands one over.
    pub async fn acquire(&self) -> Result<PooledConnection<'_>> {
        loop {
            enum Plan {
                Dial,
                Park(oneshot::Receiver<Connection>),
            }

            let plan = {
                let mut state = self.state.lock().unwrap();
                if let Some(conn) = state.idle.pop() {
                    state.active += 1;
                    return Ok(PooledConnection::new(self, conn));
                }
                if state.active + state.idle.len() < self.config.max_connections {
                    state.active += 1;
                    Plan::Dial
                } else {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push_back(tx);
                    Plan::Park(rx)
                }
            };

            match plan {
                Plan::Dial => match Connection::connect(&self.config).await {
                    Ok(conn) => return Ok(PooledConnection::new(self, conn)),
                    Err(e) => {
                        // The slot is free again; let the next waiter retry.
                        self.free_slot();
                        return Err(e);
                    }
                },
                Plan::Park(rx) => match rx.await {
                    Ok(conn) => return Ok(PooledConnection::new(self, conn)),
                    // The sender was dropped: a slot opened up without a
                    // connection to hand over. Retry from the top.
                    Err(_) => continue,
                },
            }
        }
    }

    /// Scoped send: acquire, write one command, read one response, release.
    ///
    /// The connection is returned to the pool on both the success and the
    /// error path; if this future is dropped mid-request the connection is
    /// discarded rather than re-pooled with a half-written command.
    pub async fn send(&self, command: &str) -> Result<String> {
        let mut checked_out = self.acquire().await?;
        let result = checked_out.send(command).await;
        checked_out.release();
        result
    }

    /// Close all idle connections. Checked-out connections are not severed;
    /// they are discarded when their holder releases a dead connection or
    /// drops it.
    pub fn close_all(&self) {
        let mut state = self.state.lock().unwrap();
        let n = state.idle.len();
        state.idle.clear();
        if n > 0 {
            debug!("closed {} idle gateway connection(s)", n);
        }
    }

    /// Number of idle connections.
    pub fn idle_count(&self) -> usize {
        self.state.lock().unwrap().idle.len()
    }

    /// Number of checked-out connections.
    pub fn active_count(&self) -> usize {
        self.state.lock().unwrap().active
    }

    /// Number of parked waiters.
    pub fn waiter_count(&self) -> usize {
        self.state.lock().unwrap().waiters.len()
    }

    fn release_inner(&self, conn: Connection) {
        let mut state = self.state.lock().unwrap();
        state.active -= 1;
        if !conn.is_alive() {
            debug!("discarding dead gateway connection");
            Self::wake_one(&mut state);
            return;
        }
        let mut conn = conn;
        while let Some(waiter) = state.waiters.pop_front() {
            match waiter.send(conn) {
                Ok(()) => {
                    state.active += 1;
                    return;
                }
                // The waiter gave up; try the next one.
                Err(returned) => conn = returned,
            }
        }
        state.idle.push(conn);
    }

    fn forfeit(&self, conn: Connection) {
        drop(conn);
        self.free_slot();
    }

    fn free_slot(&self) {
        let mut state = self.state.lock().unwrap();
        state.active -= 1;
        Self::wake_one(&mut state);
    }

    /// Wake the first waiter without a connection to hand over; dropping
    /// the sender makes its `acquire` retry against the freed slot.
    fn wake_one(state: &mut PoolState) {
        if let Some(waiter) = state.waiters.pop_front() {
            drop(waiter);
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("ConnectionPool")
            .field("max", &self.config.max_connections)
            .field("idle", &state.idle.len())
            .field("active", &state.active)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

/// A checked-out connection.
///
/// [`PooledConnection::release`] returns it to the pool; dropping it
/// without releasing (e.g. a cancelled request) discards the connection
/// and frees its slot.
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl<'a> PooledConnection<'a> {
    fn new(pool: &'a ConnectionPool, conn: Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
        }
    }

    /// Send one command on the checked-out connection.
    pub async fn send(&mut self, command: &str) -> Result<String> {
        self.conn
            .as_mut()
            .expect("connection already released")
            .send(command)
            .await
    }

    /// Return the connection to the pool (idle set, or directly to the
    /// first waiter). Dead connections are discarded.
    pub fn release(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release_inner(conn);
        }
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.forfeit(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Peer that answers every complete command with `!yv`.
    async fn echo_peer() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut lines = BufReader::new(read_half).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if line == "e" && write_half.write_all(b"!yv\n").await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
        addr
    }

    fn pool_for(addr: std::net::SocketAddr, max: usize) -> ConnectionPool {
        ConnectionPool::new(
            GatewayConfig::new()
                .with_address(addr)
                .with_max_connections(max),
        )
    }

    #[tokio::test]
    async fn test_acquire_reuses_idle_connection() {
        let addr = echo_peer().await;
        let pool = pool_for(addr, 2);

        let conn = pool.acquire().await.unwrap();
        conn.release();
        assert_eq!(pool.idle_count(), 1);

        let conn = pool.acquire().await.unwrap();
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.active_count(), 1);
        conn.release();
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let addr = echo_peer().await;
        let pool = Arc::new(pool_for(addr, 2));

        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.active_count(), 2);

        // Third acquire parks.
        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move {
            let conn = pool2.acquire().await.unwrap();
            conn.release();
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.waiter_count(), 1);
        assert!(pool.active_count() + pool.idle_count() <= 2);

        a.release();
        waiter.await.unwrap();
        b.release();
    }

    #[tokio::test]
    async fn test_release_hands_connection_to_waiter_directly() {
        let addr = echo_peer().await;
        let pool = Arc::new(pool_for(addr, 1));

        let held = pool.acquire().await.unwrap();
        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move {
            let mut conn = pool2.acquire().await.unwrap();
            // The handed-over connection must be usable.
            let line = conn.send("s\ne\n").await.unwrap();
            conn.release();
            line
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.waiter_count(), 1);

        held.release();
        // The connection went straight to the waiter, not through idle.
        assert_eq!(waiter.await.unwrap(), "!yv");
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_waiters_resolve_in_fifo_order() {
        let addr = echo_peer().await;
        let pool = Arc::new(pool_for(addr, 1));
        let held = pool.acquire().await.unwrap();

        let (order_tx, mut order_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tasks = Vec::new();
        for i in 0..3 {
            let pool = pool.clone();
            let order_tx = order_tx.clone();
            tasks.push(tokio::spawn(async move {
                let conn = pool.acquire().await.unwrap();
                order_tx.send(i).unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
                conn.release();
            }));
            // Make arrival order deterministic.
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert_eq!(pool.waiter_count(), 3);

        held.release();
        for task in tasks {
            task.await.unwrap();
        }
        let mut seen = Vec::new();
        while let Ok(i) = order_rx.try_recv() {
            seen.push(i);
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_dead_connection_is_discarded() {
        // Peer that accepts and immediately hangs up.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => drop(stream),
                    Err(_) => return,
                }
            }
        });

        let pool = pool_for(addr, 2);
        let mut conn = pool.acquire().await.unwrap();
        assert!(conn.send("s\ne\n").await.is_err());
        conn.release();
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.active_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_checkout_frees_slot() {
        let addr = echo_peer().await;
        let pool = pool_for(addr, 1);

        let conn = pool.acquire().await.unwrap();
        drop(conn);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.idle_count(), 0);

        // The slot is reusable.
        pool.acquire().await.unwrap().release();
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_close_all_clears_idle_only() {
        let addr = echo_peer().await;
        let pool = pool_for(addr, 2);

        let held = pool.acquire().await.unwrap();
        let other = pool.acquire().await.unwrap();
        other.release();
        assert_eq!(pool.idle_count(), 1);

        pool.close_all();
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.active_count(), 1);
        held.release();
    }

    #[tokio::test]
    async fn test_failed_dial_frees_slot() {
        let pool = pool_for("127.0.0.1:1".parse().unwrap(), 1);
        assert!(pool.acquire().await.is_err());
        assert_eq!(pool.active_count(), 0);
    }
}
