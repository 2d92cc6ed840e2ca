//! Frame pump writing playlist bytes to a client connection.
//!
//! The engine owns the per-session streaming state: the remaining client
//! offset to skip, the byte count since the last metadata packet, and the
//! loop counter. It writes as fast as the socket accepts; there is no rate
//! limiting and no per-connection timeout.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::EngineConfig;
use crate::error::PlaylistError;
use crate::playlist::Playlist;

use super::icy::metadata_packet;

/// Response for a request whose path has no playlist.
const NOT_FOUND_RESPONSE: &[u8] = b"HTTP/1.1 404 Not found\r\n\r\n";

/// Writes the 404 response.
pub async fn write_not_found<W>(conn: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    conn.write_all(NOT_FOUND_RESPONSE).await
}

/// Streams one playlist session to a client.
pub struct StreamEngine<'a> {
    config: &'a EngineConfig,
    metadata_support: bool,
    loop_playlist: bool,
    loop_times: i32,
    /// Bytes written since the last metadata packet.
    written: u64,
    /// Remaining client offset to consume before streaming.
    skip: u64,
    now_playing: String,
}

impl<'a> StreamEngine<'a> {
    /// Creates the engine for one session.
    ///
    /// `loop_times` counts whole passes over the playlist; `-1` loops until
    /// the client goes away.
    pub fn new(
        config: &'a EngineConfig,
        metadata_support: bool,
        offset: u64,
        loop_playlist: bool,
        loop_times: i32,
    ) -> Self {
        Self {
            config,
            metadata_support,
            loop_playlist,
            loop_times,
            written: 0,
            skip: offset,
            now_playing: String::new(),
        }
    }

    /// Writes the ICY success preamble.
    pub async fn write_preamble<W>(
        &self,
        conn: &mut W,
        name: &str,
        content_type: &str,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut preamble = format!(
            "ICY 200 OK\r\nContent-Type: {}\r\nicy-name: {}\r\n",
            content_type, name
        );
        if self.metadata_support {
            preamble.push_str(&format!(
                "icy-metadata: 1\r\nicy-metaint: {}\r\n",
                self.config.metadata_interval
            ));
        }
        preamble.push_str("\r\n");
        conn.write_all(preamble.as_bytes()).await
    }

    /// Pumps frames until the playlist ends, looping as configured.
    ///
    /// Returns when the playlist is exhausted (and not looping), when the
    /// loop counter runs out, or with the error that ended the session.
    pub async fn pump<W>(&mut self, conn: &mut W, playlist: &mut dyn Playlist) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        loop {
            while !playlist.finished() {
                self.log_track_change(playlist);

                let frame = match self.prepare_frame(playlist).await {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        if !playlist.finished() {
                            log::debug!(
                                "[Stream] Empty frame for: {} - {}",
                                playlist.title(),
                                playlist.artist()
                            );
                        }
                        continue;
                    }
                    Err(PlaylistError::EndOfPlaylist) => break,
                    Err(err) => {
                        log::debug!("[Stream] Error while retrieving playlist data: {}", err);
                        continue;
                    }
                };

                self.write_frame(conn, playlist, frame).await?;
            }

            // Do not loop if close fails
            if playlist.close().await.is_err() || !self.loop_playlist {
                break;
            }
            if self.loop_times != -1 {
                self.loop_times -= 1;
                if self.loop_times == 0 {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Fetches the next frame, consuming any remaining client offset.
    ///
    /// Whole frames below the offset are discarded and returned to the
    /// pool; the frame straddling it is cut so the first delivered byte is
    /// exactly the requested one.
    async fn prepare_frame(
        &mut self,
        playlist: &mut dyn Playlist,
    ) -> Result<Option<Vec<u8>>, PlaylistError> {
        let mut frame = playlist.frame().await?;

        while self.skip > 0 {
            let Some(whole) = frame else { break };
            if (self.skip as usize) < whole.len() {
                let tail = whole[self.skip as usize..].to_vec();
                playlist.release_frame(whole);
                self.skip = 0;
                frame = Some(tail);
            } else {
                self.skip -= whole.len() as u64;
                playlist.release_frame(whole);
                frame = playlist.frame().await?;
            }
        }

        Ok(frame)
    }

    /// Writes one frame, interleaving a metadata packet when the interval
    /// boundary falls inside it.
    async fn write_frame<W>(
        &mut self,
        conn: &mut W,
        playlist: &mut dyn Playlist,
        frame: Vec<u8>,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let len = frame.len() as u64;

        if self.metadata_support && self.written + len >= self.config.metadata_interval {
            let boundary =
                (self.config.metadata_interval.saturating_sub(self.written) as usize).min(frame.len());

            conn.write_all(&frame[..boundary]).await?;
            let packet = metadata_packet(
                playlist.title(),
                playlist.artist(),
                self.config.max_metadata_size,
            );
            conn.write_all(&packet).await?;
            conn.write_all(&frame[boundary..]).await?;

            self.written = self.written + len - self.config.metadata_interval;
        } else {
            conn.write_all(&frame).await?;
            self.written += len;
            playlist.release_frame(frame);
        }

        Ok(())
    }

    fn log_track_change(&mut self, playlist: &dyn Playlist) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let playing = format!("{} - {}", playlist.title(), playlist.artist());
        if playing != self.now_playing {
            log::debug!("[Stream] Written bytes: {}", self.written);
            log::debug!("[Stream] Sending: {}", playing);
            self.now_playing = playing;
        }
    }
}
