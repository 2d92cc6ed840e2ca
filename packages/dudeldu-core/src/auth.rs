//! Basic authentication and the peer reconnect cache.
//!
//! Some clients (VLC among them) authenticate on one connection, then
//! reconnect from a different port and just expect the stream. Successfully
//! authenticated hosts are therefore remembered by IP for a short window;
//! an empty request from a remembered host replays the request that carried
//! the credential.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use dashmap::DashMap;

use crate::error::AuthError;
use crate::request::StreamRequest;

/// A remembered authentication from one host.
#[derive(Debug, Clone)]
pub struct PeerAuthRecord {
    /// Decoded `user:pass` the host presented.
    pub credential: String,
    /// The request that carried the credential; replayed on empty reconnects.
    pub request: StreamRequest,
    expires_at: Instant,
}

/// Remembers which hosts presented a valid credential recently.
///
/// Shared by all connection workers. Entries expire a fixed TTL after
/// insertion and are evicted lazily on access.
#[derive(Debug)]
pub struct PeerAuthCache {
    ttl: Duration,
    entries: DashMap<IpAddr, PeerAuthRecord>,
}

impl PeerAuthCache {
    /// Creates a cache whose entries live for `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns the live record for `peer`, evicting an expired one.
    pub fn get(&self, peer: IpAddr) -> Option<PeerAuthRecord> {
        let record = self.entries.get(&peer)?.value().clone();
        if record.expires_at <= Instant::now() {
            self.entries.remove(&peer);
            return None;
        }
        Some(record)
    }

    /// Stores a fresh record for `peer`, restarting its expiry window.
    pub fn insert(&self, peer: IpAddr, credential: String, request: StreamRequest) {
        self.entries.insert(
            peer,
            PeerAuthRecord {
                credential,
                request,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Number of stored records, including not yet evicted expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validates Basic credentials and applies the reconnect workaround.
pub struct Authenticator {
    credential: Option<String>,
    peers: PeerAuthCache,
}

impl Authenticator {
    /// Creates an authenticator requiring `credential` (`user:pass`);
    /// `None` accepts everyone.
    pub fn new(credential: Option<String>, peer_ttl: Duration) -> Self {
        Self {
            credential,
            peers: PeerAuthCache::new(peer_ttl),
        }
    }

    /// Decides whether the request from `peer` may be served.
    ///
    /// Returns the request to serve - normally the presented one, but a
    /// remembered host reconnecting with an empty block (`empty`) gets its
    /// cached request replayed. The cache entry itself is the authorization
    /// witness on that path; the stored credential is not compared again.
    pub fn authorize(
        &self,
        peer: IpAddr,
        request: StreamRequest,
        empty: bool,
    ) -> Result<StreamRequest, AuthError> {
        if let Some(token) = &request.auth_token {
            let decoded = STANDARD
                .decode(token)
                .map_err(|_| AuthError::MalformedCredential)?;
            let presented = String::from_utf8_lossy(&decoded).into_owned();

            if let Some(expected) = &self.credential {
                if &presented != expected {
                    return Err(AuthError::WrongCredential(presented));
                }
            }

            // Remember the host so it can connect again without credentials
            self.peers.insert(peer, presented, request.clone());
            return Ok(request);
        }

        let cached = self.peers.get(peer);

        if empty {
            if let Some(record) = cached {
                log::debug!("[Auth] Replaying cached request for {}", peer);
                return Ok(record.request);
            }
        } else if cached.is_some() {
            return Ok(request);
        }

        if self.credential.is_some() {
            return Err(AuthError::MissingCredential);
        }
        Ok(request)
    }
}
