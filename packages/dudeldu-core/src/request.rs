//! Decoder for the hybrid HTTP/ICY request block.
//!
//! Streaming clients send a single header block terminated by `\r\n\r\n`.
//! The block is not required to be well-formed HTTP: some clients (VLC)
//! reconnect with an empty block and expect the stream straight away, so an
//! immediate EOF decodes as an empty request and is sorted out by the
//! authentication layer.

use std::sync::OnceLock;

use regex_lite::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::DecodeError;

const TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK_SIZE: usize = 512;

fn path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)get\s+(\S+)").expect("valid pattern"))
}

fn offset_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^range: bytes=([0-9]+)-").expect("valid pattern"))
}

fn auth_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^authorization: basic (\S+)").expect("valid pattern"))
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// Requested web path, if the block contained a GET line.
    pub path: Option<String>,

    /// Starting byte offset from a `Range: bytes=<n>-` header.
    pub offset: u64,

    /// Whether the client accepts interleaved ICY metadata.
    pub metadata: bool,

    /// Base64 token from an `Authorization: Basic` header.
    pub auth_token: Option<String>,
}

impl StreamRequest {
    /// Extracts the recognized tokens from a header block.
    ///
    /// Matching is case-insensitive and line-oriented; anything the block
    /// does not contain falls back to its default (no path, offset 0, no
    /// metadata, no credential).
    pub fn parse(header: &str) -> Self {
        let path = path_pattern()
            .captures(header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        let offset = offset_pattern()
            .captures(header)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        let metadata = header.to_lowercase().contains("icy-metadata: 1");

        let auth_token = auth_pattern()
            .captures(header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        Self {
            path,
            offset,
            metadata,
            auth_token,
        }
    }
}

/// Reads a request block from `conn`.
///
/// Accumulates bytes until the `\r\n\r\n` terminator appears; the returned
/// text excludes the terminator. EOF before the terminator yields whatever
/// arrived (the empty string for an immediate EOF). More than `max_size`
/// bytes without a terminator fail with [`DecodeError::RequestTooLong`].
pub async fn read_request_header<R>(conn: &mut R, max_size: usize) -> Result<String, DecodeError>
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        if let Some(pos) = find_terminator(&buf) {
            buf.truncate(pos);
            break;
        }
        if buf.len() > max_size {
            return Err(DecodeError::RequestTooLong);
        }
        let n = conn.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    if buf.len() < TERMINATOR.len() {
        return None;
    }
    buf.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}
