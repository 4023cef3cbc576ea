//! Line framing codec for the IRC transport.
//!
//! The decoder reconstructs discrete protocol lines from an unreliable byte
//! stream, buffering any incomplete tail until the terminator arrives. The
//! encoder clamps outbound frames to the protocol's 512-byte limit.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::ProtocolError;

/// Maximum IRC frame size in bytes, terminator included.
pub const MAX_FRAME_LEN: usize = 512;

/// Newline-delimited codec with outbound length clamping.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Index of the next byte to check for a newline.
    next_index: usize,
}

impl LineCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                // No complete line yet; remember where we stopped so the
                // next call resumes scanning after the buffered tail.
                self.next_index = src.len();
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            // Decode lossily: a stray invalid byte must not poison the
            // stream, it becomes U+FFFD and the line stays usable.
            let text = match String::from_utf8(line.to_vec()) {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        byte_pos = e.utf8_error().valid_up_to(),
                        "replacing invalid UTF-8 in inbound line"
                    );
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };

            let trimmed = text.trim_matches(['\r', '\n']);
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_owned()));
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        if let Some(frame) = clamp_frame(&item) {
            dst.extend_from_slice(frame.as_bytes());
        }
        Ok(())
    }
}

/// Clamp one outbound command to the 512-byte frame limit.
///
/// Blank input yields `None` (a silent no-op per the write contract). The
/// terminator is appended when missing; content that would overflow the
/// frame is truncated to 510 bytes on a character boundary and trailing
/// whitespace is trimmed before the terminator is re-appended, so the final
/// frame is always at most 512 bytes and always ends with CRLF.
pub fn clamp_frame(data: &str) -> Option<String> {
    if data.trim().is_empty() {
        return None;
    }

    let body = data.trim_end_matches(['\r', '\n']);
    let mut out = if body.len() > MAX_FRAME_LEN - 2 {
        let mut cut = MAX_FRAME_LEN - 2;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body[..cut].trim_end().to_owned()
    } else {
        body.to_owned()
    };
    out.push_str("\r\n");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(":srv PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some(":srv PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_partial_then_completion() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(":srv PING");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b" :tail\r\n:srv NOTICE");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(":srv PING :tail".to_string())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b":srv NOTICE");
    }

    #[test]
    fn decode_skips_empty_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("\r\n\r\n:srv A\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(":srv A".to_string()));
    }

    #[test]
    fn decode_multiple_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(":srv A\r\n:srv B\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(":srv A".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(":srv B".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_replaces_invalid_utf8_and_keeps_stream_alive() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b":srv NOTICE me :caf\xe9\r\nPING :after\r\n"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(":srv NOTICE me :caf\u{FFFD}".to_string())
        );
        // The line after the bad byte decodes normally.
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PING :after".to_string())
        );
    }

    #[test]
    fn decode_bare_newline_terminator() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(":srv A\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(":srv A".to_string()));
    }

    #[test]
    fn clamp_blank_is_noop() {
        assert_eq!(clamp_frame(""), None);
        assert_eq!(clamp_frame("   "), None);
        assert_eq!(clamp_frame("\r\n"), None);
    }

    #[test]
    fn clamp_appends_terminator() {
        assert_eq!(clamp_frame("PING srv").as_deref(), Some("PING srv\r\n"));
        assert_eq!(clamp_frame("PING srv\r\n").as_deref(), Some("PING srv\r\n"));
    }

    #[test]
    fn clamp_truncates_oversized_frame() {
        let long = format!("PRIVMSG #chan :{}", "x".repeat(600));
        let frame = clamp_frame(&long).unwrap();
        assert!(frame.len() <= MAX_FRAME_LEN);
        assert!(frame.ends_with("\r\n"));
        assert!(!frame[..frame.len() - 2].ends_with(' '));
    }

    #[test]
    fn clamp_exactly_510_bytes_untouched() {
        let body = "y".repeat(510);
        let frame = clamp_frame(&body).unwrap();
        assert_eq!(frame.len(), MAX_FRAME_LEN);
        assert_eq!(&frame[..510], body.as_str());
    }

    #[test]
    fn clamp_respects_char_boundaries() {
        // Multi-byte content straddling the cut point must not split a char.
        let long = format!("PRIVMSG #chan :{}", "é".repeat(300));
        let frame = clamp_frame(&long).unwrap();
        assert!(frame.len() <= MAX_FRAME_LEN);
        assert!(frame.ends_with("\r\n"));
    }

    #[test]
    fn encode_writes_clamped_frame() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("QUIT :bye".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"QUIT :bye\r\n");

        buf.clear();
        codec.encode("   ".to_string(), &mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
