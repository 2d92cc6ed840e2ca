//! Centralized error types for the DudelDu core library.
//!
//! Each pipeline stage has its own error enum; nothing here escapes a
//! connection worker - the handler logs, answers where the protocol
//! requires a response, and closes.

use std::io;

use thiserror::Error;

/// Errors raised while running the TCP acceptor.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind or inspect the listening socket.
    #[error("Failed to bind listener: {0}")]
    Bind(#[from] io::Error),
}

/// Convenient Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors from decoding a client's request block.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The block exceeded the request size limit without a terminator.
    #[error("Request is too long")]
    RequestTooLong,

    /// The connection failed while reading the block.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Rejection reasons for a client request; each is answered with 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The Authorization header did not decode as base64.
    #[error("Cannot decode authentication")]
    MalformedCredential,

    /// The decoded credential did not match the configured one.
    #[error("Wrong authentication: {0}")]
    WrongCredential(String),

    /// A credential is required but the request carried none.
    #[error("No authentication found")]
    MissingCredential,
}

/// Errors surfaced by playlist implementations.
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// The end of the playlist has been reached.
    #[error("End of playlist")]
    EndOfPlaylist,

    /// A playlist definition could not be read or parsed.
    #[error("Invalid playlist definition: {0}")]
    Definition(String),

    /// An item byte source failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PlaylistError {
    /// True for the sentinel that terminates the frame pump.
    pub fn is_end_of_playlist(&self) -> bool {
        matches!(self, Self::EndOfPlaylist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_too_long_display_is_stable() {
        assert_eq!(DecodeError::RequestTooLong.to_string(), "Request is too long");
    }

    #[test]
    fn end_of_playlist_is_recognized() {
        assert!(PlaylistError::EndOfPlaylist.is_end_of_playlist());
        assert!(!PlaylistError::Definition("bad".into()).is_end_of_playlist());
    }
}
