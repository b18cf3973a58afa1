#![cfg(test)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Loopback server standing in for the proxied target.
///
/// Every byte it receives, over all connections, is appended to `received`.
pub struct TestTarget {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<u8>>>,
    accepted: Arc<Mutex<usize>>,
    _handle: JoinHandle<()>,
}

#[derive(Clone, Copy)]
enum Behavior {
    /// Replies `PONG` to every `PING`, echoes anything else.
    PingPong,
    /// Reads one byte at a time, pausing between reads.
    Slow(Duration),
    /// Closes each connection right after accepting it.
    Hangup,
}

impl TestTarget {
    pub async fn ping_pong() -> Self {
        Self::start(Behavior::PingPong).await
    }

    pub async fn slow(delay: Duration) -> Self {
        Self::start(Behavior::Slow(delay)).await
    }

    pub async fn hangup() -> Self {
        Self::start(Behavior::Hangup).await
    }

    async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test target");
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(Mutex::new(0));

        let handle = tokio::spawn({
            let received = received.clone();
            let accepted = accepted.clone();
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    *accepted.lock().unwrap() += 1;
                    tokio::spawn(serve(socket, behavior, received.clone()));
                }
            }
        });

        Self {
            addr,
            received,
            accepted,
            _handle: handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn received(&self) -> Vec<u8> {
        self.received.lock().unwrap().clone()
    }

    pub fn accepted(&self) -> usize {
        *self.accepted.lock().unwrap()
    }

    /// Poll until `expected` bytes arrived or `limit` elapses.
    pub async fn wait_for_received(&self, expected: usize, limit: Duration) -> Vec<u8> {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            let received = self.received();
            if received.len() >= expected || tokio::time::Instant::now() >= deadline {
                return received;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn serve(mut socket: TcpStream, behavior: Behavior, received: Arc<Mutex<Vec<u8>>>) {
    match behavior {
        Behavior::Hangup => drop(socket),
        Behavior::PingPong => {
            let mut buf = [0u8; 1024];
            loop {
                let n = match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => n,
                };
                received.lock().unwrap().extend_from_slice(&buf[..n]);
                let reply: &[u8] = if &buf[..n] == b"PING" { b"PONG" } else { &buf[..n] };
                if socket.write_all(reply).await.is_err() {
                    return;
                }
            }
        }
        Behavior::Slow(delay) => {
            let mut byte = [0u8; 1];
            loop {
                sleep(delay).await;
                match socket.read(&mut byte).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => received.lock().unwrap().push(byte[0]),
                }
            }
        }
    }
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
