//! Default connection pipeline: decode, authenticate, stream.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::auth::Authenticator;
use crate::config::EngineConfig;
use crate::playlist::PlaylistFactory;
use crate::request::{read_request_header, StreamRequest};
use crate::server::RequestHandler;
use crate::stream::engine::{write_not_found, StreamEngine};

/// Response for every rejected request.
const UNAUTHORIZED_RESPONSE: &[u8] = b"HTTP/1.1 401 Authorization Required\r\n\
    WWW-Authenticate: Basic realm=\"DudelDu Streaming Server\"\r\n\r\n";

/// Loop counter sentinel: replay the playlist until the client goes away.
pub const LOOP_FOREVER: i32 = -1;

/// Default [`RequestHandler`] for the DudelDu server.
///
/// Owns everything a connection needs: the playlist factory, the engine
/// configuration, the looping/shuffle policy and the authenticator with
/// its shared peer cache.
pub struct StreamHandler {
    factory: Arc<dyn PlaylistFactory>,
    config: EngineConfig,
    auth: Authenticator,
    loop_playlist: bool,
    loop_times: i32,
    shuffle: bool,
}

impl StreamHandler {
    /// Creates a handler. `credential` is the required `user:pass`; `None`
    /// runs an open server.
    pub fn new(
        factory: Arc<dyn PlaylistFactory>,
        config: EngineConfig,
        loop_playlist: bool,
        shuffle: bool,
        credential: Option<String>,
    ) -> Self {
        let auth = Authenticator::new(credential, config.peer_auth_ttl);
        Self {
            factory,
            config,
            auth,
            loop_playlist,
            loop_times: LOOP_FOREVER,
            shuffle,
        }
    }

    /// Sets how many passes a looping playlist makes
    /// ([`LOOP_FOREVER`] = endless).
    pub fn with_loop_times(mut self, loop_times: i32) -> Self {
        self.loop_times = loop_times;
        self
    }

    async fn serve(&self, conn: &mut TcpStream, path: &str, request: StreamRequest) {
        log::debug!(
            "[Stream] Serve request path: {} metadata support: {} offset: {}",
            path,
            request.metadata,
            request.offset
        );

        let Some(mut playlist) = self.factory.playlist(path, self.shuffle) else {
            if let Err(e) = write_not_found(conn).await {
                log::debug!("[Stream] {}", e);
            }
            return;
        };

        let mut engine = StreamEngine::new(
            &self.config,
            request.metadata,
            request.offset,
            self.loop_playlist,
            self.loop_times,
        );

        let name = playlist.name().to_string();
        let content_type = playlist.content_type();
        let result = async {
            engine.write_preamble(conn, &name, &content_type).await?;
            engine.pump(conn, playlist.as_mut()).await
        }
        .await;

        match result {
            Ok(()) => log::debug!("[Stream] Serve request path: {} complete", path),
            Err(e) if e.kind() == std::io::ErrorKind::WriteZero => {
                log::debug!("[Stream] Could not write to client - closing connection");
            }
            Err(e) => log::debug!("[Stream] {}", e),
        }
    }
}

#[async_trait]
impl RequestHandler for StreamHandler {
    async fn handle(&self, mut conn: TcpStream, peer: SocketAddr) {
        log::debug!("[Handler] Handling request from: {}", peer);

        let header = match read_request_header(&mut conn, self.config.max_request_size).await {
            Ok(header) => header,
            Err(e) => {
                log::debug!("[Handler] {}", e);
                return;
            }
        };

        let text = header.trim();
        log::debug!("[Handler] Client: {} Request: {:?}", peer, text);

        let request = StreamRequest::parse(text);
        let request = match self.auth.authorize(peer.ip(), request, text.is_empty()) {
            Ok(request) => request,
            Err(e) => {
                log::debug!("[Auth] {}", e);
                let _ = conn.write_all(UNAUTHORIZED_RESPONSE).await;
                return;
            }
        };

        let Some(path) = request.path.clone() else {
            log::debug!("[Handler] Invalid request: {:?}", text);
            return;
        };

        self.serve(&mut conn, &path, request).await;
    }
}
