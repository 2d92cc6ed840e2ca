//! DudelDu Core - shared library for the DudelDu streaming server.
//!
//! This crate implements a simple audio/video streaming server speaking the
//! SHOUTcast/ICY dialect of HTTP. For each accepted client the server picks
//! a named playlist, opens its items in order and pushes their raw bytes
//! down the connection, optionally interleaving ICY metadata packets that
//! carry the currently playing artist and title.
//!
//! The metadata framing follows the de-facto Shoutcast specification:
//!
//! <http://www.smackfu.com/stuff/programming/shoutcast.html>
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`server`]: TCP acceptor with graceful shutdown
//! - [`request`]: decoder for the hybrid HTTP/ICY request block
//! - [`auth`]: Basic authentication and the peer reconnect cache
//! - [`stream`]: streaming engine (frame pump, metadata interleave)
//! - [`playlist`]: playlist capability and the bundled implementations
//! - [`config`]: immutable engine configuration
//! - [`error`]: centralized error types
//!
//! # Abstraction Traits
//!
//! Two traits decouple the engine from concrete collaborators:
//!
//! - [`RequestHandler`](server::RequestHandler): full per-connection pipeline,
//!   implemented by [`StreamHandler`](handler::StreamHandler)
//! - [`Playlist`](playlist::Playlist) / [`PlaylistFactory`](playlist::PlaylistFactory):
//!   byte and metadata source for one session, implemented by the file,
//!   HTTP and in-memory variants

#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod playlist;
pub mod request;
pub mod server;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export commonly used types at the crate root
pub use auth::{Authenticator, PeerAuthCache, PeerAuthRecord};
pub use config::EngineConfig;
pub use error::{AuthError, DecodeError, PlaylistError, ServerError, ServerResult};
pub use handler::{StreamHandler, LOOP_FOREVER};
pub use playlist::{
    FilePlaylist, FilePlaylistFactory, FramePool, HttpPlaylistFactory, MemoryItem, MemoryPlaylist,
    Playlist, PlaylistFactory, PlaylistItem,
};
pub use request::StreamRequest;
pub use server::{RequestHandler, Server, ServerStatus};
