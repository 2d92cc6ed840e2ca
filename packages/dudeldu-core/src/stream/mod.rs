//! Streaming engine: ICY response preamble, frame pump, metadata packets.

pub mod engine;
pub mod icy;

pub use engine::{write_not_found, StreamEngine};
pub use icy::metadata_packet;
