//! Playlist capability and frame buffer pooling.
//!
//! A playlist supplies a connection worker with a continuous stream of
//! bytes plus metadata about the current title. A factory maps a requested
//! web path to a fresh playlist session per connection; the session is
//! exclusively owned by its worker and never shared.

pub mod catalogue;
pub mod file;
pub mod http;
pub mod memory;

pub use catalogue::{content_type_for, strip_c_style_comments, Catalogue, PlaylistItem};
pub use file::{FilePlaylist, FilePlaylistFactory};
pub use http::HttpPlaylistFactory;
pub use memory::{MemoryItem, MemoryPlaylist};

use std::io;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::PlaylistError;

/// Maximum buffers kept on a session's free list.
const MAX_POOLED_FRAMES: usize = 32;

/// Byte and metadata source for one streaming session.
///
/// The engine depends only on these operations; implementations decide
/// where the bytes come from (files, URLs, memory).
#[async_trait]
pub trait Playlist: Send {
    /// Stable label of this playlist, sent as `icy-name`.
    fn name(&self) -> &str;

    /// MIME content type of the current item.
    fn content_type(&self) -> String;

    /// Artist of the current item. Once the playlist is exhausted this
    /// keeps reporting the last item; it never goes out of bounds.
    fn artist(&self) -> &str;

    /// Title of the current item, with the same exhaustion behavior as
    /// [`artist`](Playlist::artist).
    fn title(&self) -> &str;

    /// Returns the next chunk of at most the configured frame size,
    /// advancing across items transparently.
    ///
    /// `Err(EndOfPlaylist)` signals exhaustion with no data left. A partial
    /// final chunk is returned as `Ok(Some(partial))` with
    /// [`finished`](Playlist::finished) flipping to true. Items that fail
    /// to open are logged, skipped, and never retried.
    async fn frame(&mut self) -> Result<Option<Vec<u8>>, PlaylistError>;

    /// Hints that `frame` may be reused for a later read.
    fn release_frame(&mut self, frame: Vec<u8>);

    /// True once the playlist is exhausted; `frame` then yields
    /// `EndOfPlaylist` until [`close`](Playlist::close) resets the cursor.
    fn finished(&self) -> bool;

    /// Releases open sources and resets the cursor to the start, making
    /// the playlist replayable. May be called repeatedly.
    async fn close(&mut self) -> io::Result<()>;
}

/// Produces a fresh [`Playlist`] session for a requested web path.
pub trait PlaylistFactory: Send + Sync {
    /// Returns a playlist for `path`, or `None` if the path is unknown.
    fn playlist(&self, path: &str, shuffle: bool) -> Option<Box<dyn Playlist>>;
}

/// Bounded free list of frame buffers for one session.
///
/// Only buffers of exactly the frame size are recycled; truncated terminal
/// frames are dropped. Buffers beyond the bound are dropped as well.
#[derive(Debug)]
pub struct FramePool {
    frame_size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl FramePool {
    /// Creates an empty pool handing out buffers of `frame_size` bytes.
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            free: Mutex::new(Vec::new()),
        }
    }

    /// Returns a zeroed or recycled buffer of exactly the frame size.
    pub fn get(&self) -> Vec<u8> {
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; self.frame_size])
    }

    /// Accepts `buf` back for reuse if it still has the frame size.
    pub fn put(&self, buf: Vec<u8>) {
        if buf.len() != self.frame_size {
            return;
        }
        let mut free = self.free.lock();
        if free.len() < MAX_POOLED_FRAMES {
            free.push(buf);
        }
    }

    /// The buffer size this pool hands out.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_zeroed_buffer_of_frame_size() {
        let pool = FramePool::new(16);
        let buf = pool.get();
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn full_size_buffers_are_recycled() {
        let pool = FramePool::new(16);
        let mut buf = pool.get();
        buf[0] = 42;
        pool.put(buf);

        let recycled = pool.get();
        assert_eq!(recycled[0], 42);
    }

    #[test]
    fn truncated_buffers_are_not_pooled() {
        let pool = FramePool::new(16);
        let mut buf = pool.get();
        buf.truncate(3);
        pool.put(buf);

        let fresh = pool.get();
        assert_eq!(fresh.len(), 16);
        assert!(fresh.iter().all(|&b| b == 0));
    }

    #[test]
    fn free_list_is_bounded() {
        let pool = FramePool::new(4);
        for _ in 0..(MAX_POOLED_FRAMES + 10) {
            pool.put(vec![0u8; 4]);
        }
        assert_eq!(pool.free.lock().len(), MAX_POOLED_FRAMES);
    }
}
