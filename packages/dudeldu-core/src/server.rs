//! TCP acceptor with graceful shutdown.
//!
//! The acceptor owns the listening socket; each accepted connection runs
//! the full request pipeline on its own task so slow clients never block
//! new accepts. Shutdown stops the accept loop promptly but does not tear
//! down in-flight connections.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{ServerError, ServerResult};

/// Lifecycle notifications emitted by [`Server::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    /// The listener is bound and about to accept; carries the local
    /// address so callers binding port 0 learn the real one.
    Listening(SocketAddr),
    /// The accept loop has terminated.
    Stopped,
}

/// Handles one accepted connection through the full request pipeline.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Serves `conn` until the session ends; must not panic the worker.
    async fn handle(&self, conn: TcpStream, peer: SocketAddr);
}

/// SHOUTcast server: accepts connections and dispatches each to a worker.
pub struct Server {
    handler: Arc<dyn RequestHandler>,
    cancel: CancellationToken,
    running: AtomicBool,
}

impl Server {
    /// Creates a server dispatching connections to `handler`.
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self {
            handler,
            cancel: CancellationToken::new(),
            running: AtomicBool::new(false),
        }
    }

    /// True while the accept loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals the accept loop to stop. In-flight connections keep going.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Binds `addr` and serves until [`shutdown`](Server::shutdown).
    ///
    /// Bind failures are returned synchronously. When a status channel is
    /// given, [`ServerStatus::Listening`] is sent once the listener is
    /// bound and [`ServerStatus::Stopped`] after the accept loop ends.
    pub async fn run(
        &self,
        addr: &str,
        status: Option<mpsc::UnboundedSender<ServerStatus>>,
    ) -> ServerResult<()> {
        let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
        let local = listener.local_addr().map_err(ServerError::Bind)?;

        log::info!("[Server] Listening on {}", local);
        if let Some(status) = &status {
            let _ = status.send(ServerStatus::Listening(local));
        }
        self.running.store(true, Ordering::SeqCst);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((conn, peer)) => {
                        let handler = Arc::clone(&self.handler);
                        tokio::spawn(async move {
                            handler.handle(conn, peer).await;
                        });
                    }
                    Err(e) if is_transient(&e) => continue,
                    Err(e) => log::warn!("[Server] Accept failed: {}", e),
                },
            }
        }

        self.running.store(false, Ordering::SeqCst);
        log::info!("[Server] Accept loop stopped");
        if let Some(status) = &status {
            let _ = status.send(ServerStatus::Stopped);
        }
        Ok(())
    }
}

/// Accept errors that resolve themselves on the next accept.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Handler that greets and hangs up, so tests can see workers run.
    struct GreetingHandler;

    #[async_trait]
    impl RequestHandler for GreetingHandler {
        async fn handle(&self, mut conn: TcpStream, _peer: SocketAddr) {
            let _ = conn.write_all(b"Hello").await;
        }
    }

    async fn start_server(server: Arc<Server>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = Arc::clone(&server);
        let task = tokio::spawn(async move {
            run.run("127.0.0.1:0", Some(tx)).await.unwrap();
        });

        match rx.recv().await.unwrap() {
            ServerStatus::Listening(addr) => (addr, task),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[tokio::test]
    async fn serves_connections_until_shutdown() {
        let server = Arc::new(Server::new(Arc::new(GreetingHandler)));
        let (addr, task) = start_server(Arc::clone(&server)).await;
        assert!(server.is_running());

        let mut conn = TcpStream::connect(addr).await.unwrap();
        let mut out = Vec::new();
        conn.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"Hello");

        server.shutdown();
        task.await.unwrap();
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn bind_failure_is_returned_synchronously() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let server = Server::new(Arc::new(GreetingHandler));
        let result = server.run(&addr.to_string(), None).await;
        assert!(result.is_err());
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn status_channel_reports_stop() {
        let server = Arc::new(Server::new(Arc::new(GreetingHandler)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = Arc::clone(&server);
        let task = tokio::spawn(async move { run.run("127.0.0.1:0", Some(tx)).await });

        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerStatus::Listening(_)
        ));

        server.shutdown();
        task.await.unwrap().unwrap();
        assert_eq!(rx.recv().await.unwrap(), ServerStatus::Stopped);
    }
}
