//! Playlist catalogue definitions.
//!
//! A catalogue is a JSON object mapping web paths to ordered item lists:
//!
//! ```json
//! {
//!     "/mylist": [
//!         {"artist": "...", "title": "...", "path": "demo/track1.mp3"}
//!     ]
//! }
//! ```
//!
//! The web path is what streaming clients request (`/mylist` is served at
//! `http://myserver:9091/mylist`); each item path is a local file or a URL
//! reachable by the server process. C-style comments are allowed in the
//! definition and stripped before a retry parse.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// One ordered element of a playlist definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistItem {
    /// Artist shown in the metadata stream.
    #[serde(default)]
    pub artist: String,

    /// Title shown in the metadata stream.
    #[serde(default)]
    pub title: String,

    /// Local file path or URL of the item's bytes.
    pub path: String,
}

/// Catalogue mapping web path to playlist items.
pub type Catalogue = HashMap<String, Vec<PlaylistItem>>;

/// Parses a catalogue definition, tolerating C-style comments.
///
/// The raw text is tried first; on failure the comments are stripped and
/// the parse retried, so error positions of a genuinely broken definition
/// refer to the stripped text.
pub fn parse_catalogue(text: &str) -> Result<Catalogue, serde_json::Error> {
    serde_json::from_str(text).or_else(|_| serde_json::from_str(&strip_c_style_comments(text)))
}

/// Removes `//` line comments (including the trailing newline) and
/// `/* ... */` block comments. Comment markers inside JSON strings are
/// left alone.
pub fn strip_c_style_comments(src: &str) -> String {
    let bytes = src.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                // Copy the string literal verbatim, honoring escapes
                out.push(bytes[i]);
                i += 1;
                while i < bytes.len() {
                    out.push(bytes[i]);
                    match bytes[i] {
                        b'\\' if i + 1 < bytes.len() => {
                            out.push(bytes[i + 1]);
                            i += 2;
                        }
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                // Swallow the newline so the comment leaves no blank line
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Returns the MIME content type for an item path from its file extension.
///
/// Unknown extensions yield the generic `"audio"`.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "aac" => "audio/x-aac",
        "mp4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "nsv" => "video/nsv",
        "ogg" | "spx" | "opus" | "oga" => "audio/ogg",
        "ogv" => "video/ogg",
        "weba" => "audio/webm",
        "webm" => "video/webm",
        "axa" => "audio/annodex",
        "axv" => "video/annodex",
        _ => "audio",
    }
}
