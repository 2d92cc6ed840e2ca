//! Shared test fixtures for engine and pipeline tests.
//!
//! The scripted playlist returns a fixed sequence of frames, one per
//! `frame()` call, so tests control frame boundaries exactly.

use std::io;

use async_trait::async_trait;

use crate::error::PlaylistError;
use crate::playlist::{Playlist, PlaylistFactory};

/// One scripted `frame()` outcome.
#[derive(Debug, Clone)]
pub enum ScriptedFrame {
    /// A frame with these exact bytes.
    Data(Vec<u8>),
    /// An empty slot (`Ok(None)`): the engine logs and moves on.
    Empty,
    /// A transient error: the engine logs and moves on.
    Error(&'static str),
}

/// Playlist yielding its scripted frames in order; `close()` rewinds.
pub struct ScriptedPlaylist {
    name: String,
    artist: String,
    title: String,
    content_type: String,
    frames: Vec<ScriptedFrame>,
    cursor: usize,
}

/// Scripted playlist with the fixture defaults.
pub fn scripted(frames: Vec<ScriptedFrame>) -> ScriptedPlaylist {
    ScriptedPlaylist {
        name: "TestPlaylist".to_string(),
        artist: "Test Artist".to_string(),
        title: "Test Title".to_string(),
        content_type: "Test/Content".to_string(),
        frames,
        cursor: 0,
    }
}

impl ScriptedPlaylist {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

#[async_trait]
impl Playlist for ScriptedPlaylist {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> String {
        self.content_type.clone()
    }

    fn artist(&self) -> &str {
        &self.artist
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn frame(&mut self) -> Result<Option<Vec<u8>>, PlaylistError> {
        if self.finished() {
            return Err(PlaylistError::EndOfPlaylist);
        }
        let entry = self.frames[self.cursor].clone();
        self.cursor += 1;
        match entry {
            ScriptedFrame::Data(data) => Ok(Some(data)),
            ScriptedFrame::Empty => Ok(None),
            ScriptedFrame::Error(msg) => Err(PlaylistError::Io(io::Error::other(msg))),
        }
    }

    fn release_frame(&mut self, _frame: Vec<u8>) {}

    fn finished(&self) -> bool {
        self.cursor == self.frames.len()
    }

    async fn close(&mut self) -> io::Result<()> {
        self.cursor = 0;
        Ok(())
    }
}

/// Factory serving a fresh scripted playlist for one configured path.
pub struct ScriptedFactory {
    pub path: &'static str,
    pub frames: Vec<ScriptedFrame>,
}

impl PlaylistFactory for ScriptedFactory {
    fn playlist(&self, path: &str, _shuffle: bool) -> Option<Box<dyn Playlist>> {
        if path == self.path {
            Some(Box::new(scripted(self.frames.clone())))
        } else {
            None
        }
    }
}
