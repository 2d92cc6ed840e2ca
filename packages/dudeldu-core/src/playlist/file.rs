//! File playlist: items resolved from local files or URLs.

use std::io;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use futures::TryStreamExt;
use rand::seq::SliceRandom;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use crate::error::PlaylistError;

use super::catalogue::{content_type_for, parse_catalogue, Catalogue, PlaylistItem};
use super::{FramePool, Playlist, PlaylistFactory};

/// Byte source of the currently open item.
type ItemSource = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Shared HTTP client for URL items.
///
/// Certificate verification is off: item URLs routinely point at ad-hoc
/// LAN boxes with self-signed certificates.
pub(crate) fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .expect("failed to build HTTP client")
    })
}

/// [`PlaylistFactory`] reading its catalogue from a JSON definition file.
pub struct FilePlaylistFactory {
    catalogue: Catalogue,
    path_prefix: String,
    frame_size: usize,
}

impl FilePlaylistFactory {
    /// Loads a catalogue from the definition file at `path`.
    ///
    /// Every item path is later prefixed with `path_prefix` before being
    /// opened.
    pub async fn new(
        path: impl AsRef<Path>,
        path_prefix: impl Into<String>,
        frame_size: usize,
    ) -> Result<Self, PlaylistError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text, path_prefix, frame_size)
    }

    /// Builds a factory from an in-memory JSON definition.
    pub fn from_json(
        text: &str,
        path_prefix: impl Into<String>,
        frame_size: usize,
    ) -> Result<Self, PlaylistError> {
        let catalogue =
            parse_catalogue(text).map_err(|e| PlaylistError::Definition(e.to_string()))?;
        Ok(Self {
            catalogue,
            path_prefix: path_prefix.into(),
            frame_size,
        })
    }
}

impl PlaylistFactory for FilePlaylistFactory {
    fn playlist(&self, path: &str, shuffle: bool) -> Option<Box<dyn Playlist>> {
        let mut items = self.catalogue.get(path)?.clone();
        if shuffle {
            items.shuffle(&mut rand::rng());
        }
        Some(Box::new(FilePlaylist::new(
            path,
            &self.path_prefix,
            items,
            self.frame_size,
        )))
    }
}

/// One session walking the items of a catalogue entry.
///
/// At most one byte source is open at a time. Items that fail to open are
/// logged and skipped; when every remaining item fails the session drains
/// to end-of-playlist instead of retrying.
pub struct FilePlaylist {
    name: String,
    path_prefix: String,
    items: Vec<PlaylistItem>,
    current: usize,
    source: Option<ItemSource>,
    finished: bool,
    pool: FramePool,
}

impl FilePlaylist {
    /// Creates a session named after its web path.
    pub fn new(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        items: Vec<PlaylistItem>,
        frame_size: usize,
    ) -> Self {
        Self {
            name: name.into(),
            path_prefix: path_prefix.into(),
            items,
            current: 0,
            source: None,
            finished: false,
            pool: FramePool::new(frame_size),
        }
    }

    fn current_item(&self) -> Option<&PlaylistItem> {
        if self.items.is_empty() {
            return None;
        }
        Some(&self.items[self.current.min(self.items.len() - 1)])
    }

    /// Opens the byte source for one item, local file or URL.
    async fn open_item(&self, item: &PlaylistItem) -> io::Result<ItemSource> {
        let location = format!("{}{}", self.path_prefix, item.path);

        let url = match reqwest::Url::parse(&location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            _ => None,
        };

        if let Some(url) = url {
            let response = http_client()
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(io::Error::other)?;
            let stream = response.bytes_stream().map_err(io::Error::other);
            Ok(Box::new(StreamReader::new(stream)))
        } else {
            Ok(Box::new(tokio::fs::File::open(&location).await?))
        }
    }

    /// Closes the current source and opens the next openable item.
    ///
    /// Returns `EndOfPlaylist` once the cursor moves past the last item.
    async fn advance(&mut self) -> Result<(), PlaylistError> {
        if self.source.take().is_some() {
            self.current += 1;
        }

        while self.current < self.items.len() {
            let item = self.items[self.current].clone();
            match self.open_item(&item).await {
                Ok(source) => {
                    self.source = Some(source);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!(
                        "[Playlist] Failed to open {}{}: {}",
                        self.path_prefix,
                        item.path,
                        e
                    );
                    self.current += 1;
                }
            }
        }

        Err(PlaylistError::EndOfPlaylist)
    }
}

#[async_trait]
impl Playlist for FilePlaylist {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> String {
        self.current_item()
            .map(|item| content_type_for(&item.path))
            .unwrap_or("audio")
            .to_string()
    }

    fn artist(&self) -> &str {
        self.current_item().map(|i| i.artist.as_str()).unwrap_or("")
    }

    fn title(&self) -> &str {
        self.current_item().map(|i| i.title.as_str()).unwrap_or("")
    }

    async fn frame(&mut self) -> Result<Option<Vec<u8>>, PlaylistError> {
        if self.finished {
            return Err(PlaylistError::EndOfPlaylist);
        }

        if self.source.is_none() {
            if let Err(e) = self.advance().await {
                self.finished = true;
                return Err(e);
            }
        }

        let mut buf = self.pool.get();
        let mut filled = 0;
        let mut end = false;

        while filled < buf.len() {
            let Some(source) = self.source.as_mut() else {
                end = true;
                break;
            };
            match source.read(&mut buf[filled..]).await {
                Ok(0) => {
                    if self.advance().await.is_err() {
                        end = true;
                        break;
                    }
                }
                Ok(n) => filled += n,
                Err(e) => {
                    // Broken mid-item source: drop it and move on
                    log::debug!(
                        "[Playlist] Read error on {}{}: {}",
                        self.path_prefix,
                        self.current_item().map(|i| i.path.as_str()).unwrap_or(""),
                        e
                    );
                    self.source = None;
                    self.current += 1;
                    if filled == 0 {
                        self.pool.put(buf);
                        return Err(e.into());
                    }
                    break;
                }
            }
        }

        if end {
            self.finished = true;
        }
        if filled == 0 {
            self.pool.put(buf);
            if end {
                return Err(PlaylistError::EndOfPlaylist);
            }
            return Ok(None);
        }

        buf.truncate(filled);
        Ok(Some(buf))
    }

    fn release_frame(&mut self, frame: Vec<u8>) {
        self.pool.put(frame);
    }

    fn finished(&self) -> bool {
        self.finished
    }

    async fn close(&mut self) -> io::Result<()> {
        self.source = None;
        self.current = 0;
        self.finished = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, data: &[u8]) {
        let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
        f.write_all(data).unwrap();
    }

    fn factory_for(dir: &tempfile::TempDir, definition: &str, frame_size: usize) -> FilePlaylistFactory {
        let prefix = format!("{}/", dir.path().display());
        FilePlaylistFactory::from_json(definition, prefix, frame_size).unwrap()
    }

    async fn drain(playlist: &mut dyn Playlist) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            match playlist.frame().await {
                Ok(Some(frame)) => out.extend_from_slice(&frame),
                Ok(None) => continue,
                Err(PlaylistError::EndOfPlaylist) => break,
                Err(e) => panic!("unexpected playlist error: {e}"),
            }
            if playlist.finished() {
                break;
            }
        }
        out
    }

    #[tokio::test]
    async fn frames_concatenate_to_item_bytes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "a.mp3", b"0123456789");
        write_file(&dir, "b.mp3", b"abcdef");

        let factory = factory_for(
            &dir,
            r#"{"/mix": [
                {"artist": "A1", "title": "T1", "path": "a.mp3"},
                {"artist": "A2", "title": "T2", "path": "b.mp3"}
            ]}"#,
            4,
        );

        let mut playlist = factory.playlist("/mix", false).unwrap();
        assert_eq!(playlist.name(), "/mix");
        assert_eq!(playlist.content_type(), "audio/mpeg");

        let body = drain(playlist.as_mut()).await;
        assert_eq!(body, b"0123456789abcdef");
        assert!(playlist.finished());
    }

    #[tokio::test]
    async fn unknown_path_yields_no_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory_for(&dir, r#"{"/mix": []}"#, 4);
        assert!(factory.playlist("/nope", false).is_none());
    }

    #[tokio::test]
    async fn replays_identically_after_close() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "a.mp3", b"replay me");

        let factory = factory_for(
            &dir,
            r#"{"/p": [{"artist": "", "title": "", "path": "a.mp3"}]}"#,
            3,
        );

        let mut playlist = factory.playlist("/p", false).unwrap();
        let first = drain(playlist.as_mut()).await;

        playlist.close().await.unwrap();
        assert!(!playlist.finished());

        let second = drain(playlist.as_mut()).await;
        assert_eq!(first, second);
        assert_eq!(first, b"replay me");
    }

    #[tokio::test]
    async fn unopenable_items_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "a.mp3", b"AAAA");
        write_file(&dir, "c.mp3", b"CCCC");

        let factory = factory_for(
            &dir,
            r#"{"/p": [
                {"artist": "", "title": "", "path": "a.mp3"},
                {"artist": "", "title": "", "path": "missing.mp3"},
                {"artist": "", "title": "", "path": "c.mp3"}
            ]}"#,
            16,
        );

        let mut playlist = factory.playlist("/p", false).unwrap();
        let body = drain(playlist.as_mut()).await;
        assert_eq!(body, b"AAAACCCC");
    }

    #[tokio::test]
    async fn all_items_unopenable_drains_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory_for(
            &dir,
            r#"{"/p": [
                {"artist": "", "title": "", "path": "gone1.mp3"},
                {"artist": "", "title": "", "path": "gone2.mp3"}
            ]}"#,
            16,
        );

        let mut playlist = factory.playlist("/p", false).unwrap();
        let err = playlist.frame().await.unwrap_err();
        assert!(err.is_end_of_playlist());
        assert!(playlist.finished());
    }

    #[tokio::test]
    async fn metadata_reports_current_then_last_item() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "a.mp3", b"AAAA");
        write_file(&dir, "b.ogg", b"BBBB");

        let factory = factory_for(
            &dir,
            r#"{"/p": [
                {"artist": "First Artist", "title": "First", "path": "a.mp3"},
                {"artist": "Second Artist", "title": "Second", "path": "b.ogg"}
            ]}"#,
            4,
        );

        let mut playlist = factory.playlist("/p", false).unwrap();
        assert_eq!(playlist.artist(), "First Artist");

        let body = drain(playlist.as_mut()).await;
        assert_eq!(body.len(), 8);

        // Exhausted: keeps reporting the last item without going out of bounds
        assert_eq!(playlist.artist(), "Second Artist");
        assert_eq!(playlist.title(), "Second");
        assert_eq!(playlist.content_type(), "audio/ogg");
    }

    #[tokio::test]
    async fn shuffle_keeps_the_same_items() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "b.mp3", "c.mp3"] {
            write_file(&dir, name, name.as_bytes());
        }

        let factory = factory_for(
            &dir,
            r#"{"/p": [
                {"artist": "", "title": "", "path": "a.mp3"},
                {"artist": "", "title": "", "path": "b.mp3"},
                {"artist": "", "title": "", "path": "c.mp3"}
            ]}"#,
            32,
        );

        let mut playlist = factory.playlist("/p", true).unwrap();
        let body = drain(playlist.as_mut()).await;

        // Items may come out in any order, but all of them exactly once
        let mut chunks: Vec<&[u8]> = body.chunks(5).collect();
        chunks.sort_unstable();
        assert_eq!(chunks, vec![&b"a.mp3"[..], b"b.mp3", b"c.mp3"]);
    }
}
