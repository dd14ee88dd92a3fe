//! Shared test harness: an in-process mock gateway.
//!
//! The mock records the exact command bytes it receives and answers each
//! complete command (terminated by the `e` line) with the next scripted
//! reply, falling back to `!yv` when the script runs dry.

#![allow(dead_code)]

use javagate_core::GatewayConfig;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct MockGateway {
    pub addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    replies: Arc<Mutex<VecDeque<String>>>,
}

impl MockGateway {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let commands: Arc<Mutex<Vec<String>>> = Arc::default();
        let replies: Arc<Mutex<VecDeque<String>>> = Arc::default();

        let commands_bg = commands.clone();
        let replies_bg = replies.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                let commands = commands_bg.clone();
                let replies = replies_bg.clone();
                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut lines = BufReader::new(read_half).lines();
                    let mut raw = String::new();
                    while let Ok(Some(line)) = lines.next_line().await {
                        // The array-length subcommand ("a"/"e") collides
                        // with the bare "e" end-of-command terminator;
                        // don't mistake that header line for the end.
                        let is_array_len_header = raw == "a\n" && line == "e";
                        raw.push_str(&line);
                        raw.push('\n');
                        if line != "e" || is_array_len_header {
                            continue;
                        }
                        commands.lock().unwrap().push(std::mem::take(&mut raw));
                        let reply = replies
                            .lock()
                            .unwrap()
                            .pop_front()
                            .unwrap_or_else(|| "!yv\n".to_string());
                        if write_half.write_all(reply.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        Self {
            addr,
            commands,
            replies,
        }
    }

    /// Queue the next reply line (must include the trailing newline).
    pub fn enqueue(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(reply.to_string());
    }

    /// Every command received so far, as exact wire bytes.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn last_command(&self) -> String {
        self.commands().last().cloned().unwrap_or_default()
    }

    pub fn config(&self) -> GatewayConfig {
        GatewayConfig::new()
            .with_address(self.addr)
            .with_callback_address("127.0.0.1:0".parse().unwrap())
    }
}
