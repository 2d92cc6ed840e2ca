//! In-memory playlist for tests and embedders.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PlaylistError;

use super::{FramePool, Playlist};

/// One in-memory playlist item.
#[derive(Debug, Clone)]
pub struct MemoryItem {
    /// Artist shown in the metadata stream.
    pub artist: String,
    /// Title shown in the metadata stream.
    pub title: String,
    /// MIME content type reported while this item plays.
    pub content_type: String,
    /// Raw bytes of the item.
    pub data: Bytes,
}

impl MemoryItem {
    /// Creates an item with the generic `"audio"` content type.
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            content_type: "audio".to_string(),
            data: data.into(),
        }
    }
}

/// [`Playlist`] over a fixed list of in-memory items.
///
/// Chunking, pooling and replay semantics match the file playlist; only
/// the byte source differs.
pub struct MemoryPlaylist {
    name: String,
    items: Vec<MemoryItem>,
    current: usize,
    position: usize,
    finished: bool,
    pool: FramePool,
}

impl MemoryPlaylist {
    /// Creates a session over `items`.
    pub fn new(name: impl Into<String>, items: Vec<MemoryItem>, frame_size: usize) -> Self {
        Self {
            name: name.into(),
            items,
            current: 0,
            position: 0,
            finished: false,
            pool: FramePool::new(frame_size),
        }
    }

    fn current_item(&self) -> Option<&MemoryItem> {
        if self.items.is_empty() {
            return None;
        }
        Some(&self.items[self.current.min(self.items.len() - 1)])
    }
}

#[async_trait]
impl Playlist for MemoryPlaylist {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> String {
        self.current_item()
            .map(|i| i.content_type.clone())
            .unwrap_or_else(|| "audio".to_string())
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

        let mut buf = self.pool.get();
        let mut filled = 0;

        while filled < buf.len() && self.current < self.items.len() {
            let data = &self.items[self.current].data;
            let remaining = &data[self.position..];
            if remaining.is_empty() {
                self.current += 1;
                self.position = 0;
                continue;
            }
            let n = remaining.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&remaining[..n]);
            filled += n;
            self.position += n;
        }

        if self.current >= self.items.len() {
            self.finished = true;
        }
        if filled == 0 {
            self.pool.put(buf);
            self.finished = true;
            return Err(PlaylistError::EndOfPlaylist);
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
        self.current = 0;
        self.position = 0;
        self.finished = false;
        Ok(())
    }
}
