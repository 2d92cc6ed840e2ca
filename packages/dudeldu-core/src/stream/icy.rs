//! ICY (Shoutcast) metadata packet formatting.
//!
//! A metadata packet is a length-prefixed block inserted into the body
//! stream: one length byte holding the number of 16-byte blocks, followed
//! by the NUL-padded `StreamTitle` text.

/// Formats the current title and artist as one ICY metadata packet.
///
/// The text is `StreamTitle='<title> - <artist>';`. Text longer than
/// `max_size` bytes is truncated to `max_size - 2` and re-terminated with
/// `';`. The packet is always `1 + 16k` bytes for `k` 16-byte blocks;
/// empty text yields the single byte `0x00`.
///
/// `max_size` must not exceed `16 * 255` so the block count fits the
/// length byte; [`EngineConfig`](crate::config::EngineConfig) enforces it.
pub fn metadata_packet(title: &str, artist: &str, max_size: usize) -> Vec<u8> {
    let mut text = format!("StreamTitle='{} - {}';", title, artist).into_bytes();

    if text.len() > max_size {
        text.truncate(max_size.saturating_sub(2));
        text.extend_from_slice(b"';");
    }

    let blocks = text.len().div_ceil(16);
    let mut packet = vec![0u8; 1 + blocks * 16];
    packet[0] = blocks as u8;
    packet[1..1 + text.len()].copy_from_slice(&text);
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_comes_before_artist() {
        let packet = metadata_packet("Test Title", "Test Artist", 4080);
        // Text is 39 bytes, so 3 blocks with 9 bytes of padding
        assert_eq!(packet[0], 3);
        assert_eq!(packet.len(), 1 + 48);
        assert_eq!(
            &packet[1..40],
            b"StreamTitle='Test Title - Test Artist';"
        );
        assert!(packet[40..].iter().all(|&b| b == 0));
    }

    #[test]
    fn length_is_always_one_plus_sixteen_k() {
        for (title, artist) in [("", ""), ("x", "y"), ("A Longer Title", "Somebody")] {
            let packet = metadata_packet(title, artist, 4080);
            assert_eq!((packet.len() - 1) % 16, 0);
            assert_eq!(packet[0] as usize * 16, packet.len() - 1);
        }
    }

    #[test]
    fn text_filling_blocks_exactly_needs_no_padding() {
        // "StreamTitle='" + text + "';" == 32 bytes
        let packet = metadata_packet("0123456789", "abcd", 4080);
        assert_eq!(packet[0], 2);
        assert_eq!(packet.len(), 33);
        assert_eq!(packet[32], b';');
    }

    #[test]
    fn long_titles_are_truncated_and_reterminated() {
        let packet = metadata_packet(
            "A very long title name which should be truncated",
            "Test Artist",
            40,
        );
        assert_eq!(packet[0], 3);
        assert_eq!(packet.len(), 1 + 48);
        assert_eq!(&packet[1..41], b"StreamTitle='A very long title name wh';");
        assert!(packet[41..].iter().all(|&b| b == 0));
    }

    #[test]
    fn truncated_text_ends_at_max_size() {
        let packet = metadata_packet("0123456789", "0123456789", 24);
        let text_len = packet[1..].iter().rposition(|&b| b != 0).unwrap() + 1;
        assert_eq!(text_len, 24);
        assert!(packet[1..1 + text_len].ends_with(b"';"));
    }
}
