//! HTTP playlist factory: catalogue fetched from a URL.
//!
//! Serves exactly like [`FilePlaylistFactory`](super::FilePlaylistFactory),
//! the definition just lives behind an HTTP endpoint instead of on disk.

use crate::error::PlaylistError;

use super::file::{http_client, FilePlaylistFactory};
use super::{Playlist, PlaylistFactory};

/// [`PlaylistFactory`] whose JSON catalogue is fetched over HTTP at startup.
pub struct HttpPlaylistFactory {
    inner: FilePlaylistFactory,
}

impl HttpPlaylistFactory {
    /// Fetches the catalogue definition from `url`.
    pub async fn new(
        url: &str,
        path_prefix: impl Into<String>,
        frame_size: usize,
    ) -> Result<Self, PlaylistError> {
        let response = http_client()
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PlaylistError::Definition(e.to_string()))?;
        let text = response
            .text()
            .await
            .map_err(|e| PlaylistError::Definition(e.to_string()))?;

        Ok(Self {
            inner: FilePlaylistFactory::from_json(&text, path_prefix, frame_size)?,
        })
    }
}

impl PlaylistFactory for HttpPlaylistFactory {
    fn playlist(&self, path: &str, shuffle: bool) -> Option<Box<dyn Playlist>> {
        self.inner.playlist(path, shuffle)
    }
}
