//! Engine configuration and protocol constants.
//!
//! The constants in this module are dictated by the ICY dialect or by what
//! deployed streaming clients expect; the [`EngineConfig`] struct carries
//! them per server instance so tests can vary the knobs without touching
//! process-wide state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Protocol Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Suggested size of a frame sent to the client at a time (bytes).
///
/// The absolute theoretical maximum frame size for MPEG audio is 2881 bytes
/// (MPEG 2.5 Layer II, 8000 Hz @ 160 kbps, with a padding slot), so 3000
/// never splits more than one MPEG frame boundary per chunk.
pub const FRAME_SIZE: usize = 3000;

/// Interval of stream bytes between two ICY metadata packets.
///
/// Announced to the client in the `icy-metaint` response header.
pub const METADATA_INTERVAL: u64 = 65536;

/// Maximum size of the metadata text (bytes); longer titles are truncated.
///
/// Must fit into 255 blocks of 16 bytes: 16 * 255 = 4080.
pub const MAX_METADATA_SIZE: usize = 4080;

/// Maximum size of an incoming request block (bytes).
pub const MAX_REQUEST_SIZE: usize = 1024;

/// Time a peer can open new connections without sending new
/// authentication information (seconds).
pub const PEER_NO_AUTH_TIMEOUT_SECS: u64 = 10;

/// Immutable configuration for one server instance.
///
/// Constructed once at startup and passed to the acceptor; nothing mutates
/// it at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Size of a playlist frame (bytes).
    pub frame_size: usize,

    /// Stream bytes between metadata packets.
    pub metadata_interval: u64,

    /// Maximum metadata text size (bytes); capped at 16 * 255.
    pub max_metadata_size: usize,

    /// Maximum request block size (bytes).
    pub max_request_size: usize,

    /// How long an authenticated peer may reconnect without credentials.
    pub peer_auth_ttl: Duration,
}

impl EngineConfig {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_size == 0 {
            return Err("frame_size must be >= 1".to_string());
        }
        if self.metadata_interval == 0 {
            return Err("metadata_interval must be >= 1".to_string());
        }
        if self.max_metadata_size > 16 * 255 {
            return Err("max_metadata_size must fit into 255 blocks of 16 bytes".to_string());
        }
        if self.max_request_size == 0 {
            return Err("max_request_size must be >= 1".to_string());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_size: FRAME_SIZE,
            metadata_interval: METADATA_INTERVAL,
            max_metadata_size: MAX_METADATA_SIZE,
            max_request_size: MAX_REQUEST_SIZE,
            peer_auth_ttl: Duration::from_secs(PEER_NO_AUTH_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_protocol_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.frame_size, 3000);
        assert_eq!(config.metadata_interval, 65536);
        assert_eq!(config.max_metadata_size, 4080);
        assert_eq!(config.max_request_size, 1024);
        assert_eq!(config.peer_auth_ttl, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oversized_metadata_limit_is_rejected() {
        let config = EngineConfig {
            max_metadata_size: 16 * 255 + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_frame_size_is_rejected() {
        let config = EngineConfig {
            frame_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
