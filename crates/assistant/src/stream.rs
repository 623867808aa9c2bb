//! Streaming response decoder
//!
//! The chat endpoint streams newline-delimited records, each a line of the
//! form `data: <json>` where the payload carries a `type` discriminator.
//! The decoder buffers raw bytes until a full line is available (network
//! buffering can split a record across reads in layers outside our control)
//! and yields typed events strictly in arrival order.
//!
//! Malformed records are logged and skipped; they never abort the stream.
//! End of stream is the end of iteration, distinct from an `error` event.

use log::warn;
use serde::Deserialize;
use std::io::Read;

use crate::tools::ToolCall;

/// Marker prefixing every event record
const EVENT_PREFIX: &str = "data: ";

/// Read chunk size for the underlying byte stream
const CHUNK_SIZE: usize = 4096;

/// One decoded event from the chat stream
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental reply text to append to the in-progress message
    Text { content: String },
    /// The full ordered batch of tool calls for this turn
    ToolCalls { tool_calls: Vec<ToolCall> },
    /// Stream metadata; may rebind the active conversation
    Meta {
        #[serde(rename = "conversationId")]
        conversation_id: Option<String>,
    },
    /// An error reported by the backend mid-stream
    Error { error: String },
}

/// Incremental decoder over a byte stream of event records
///
/// Implements `Iterator<Item = StreamEvent>`. Iteration ends at EOF or on a
/// transport read error (logged); individual bad records are skipped.
pub struct StreamDecoder<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    eof: bool,
}

impl<R: Read> StreamDecoder<R> {
    /// Create a decoder over a response byte stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            eof: false,
        }
    }

    /// Pull the next complete line out of the buffer, reading more bytes as
    /// needed. Returns None at end of stream.
    fn next_line(&mut self) -> Option<String> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                // Drop the trailing newline and any carriage return
                let end = line.len() - 1;
                let end = if end > 0 && line[end - 1] == b'\r' {
                    end - 1
                } else {
                    end
                };
                return Some(String::from_utf8_lossy(&line[..end]).into_owned());
            }

            if self.eof {
                // Flush a final unterminated line, if any
                if self.buffer.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&self.buffer).into_owned();
                self.buffer.clear();
                return Some(line);
            }

            let mut chunk = [0u8; CHUNK_SIZE];
            match self.reader.read(&mut chunk) {
                Ok(0) => self.eof = true,
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    warn!("Chat stream read failed: {}", e);
                    self.eof = true;
                    self.buffer.clear();
                    return None;
                }
            }
        }
    }

    /// Parse one line into an event. Lines without the record marker and
    /// records that fail to parse are skipped.
    fn decode_line(line: &str) -> Option<StreamEvent> {
        let payload = line.strip_prefix(EVENT_PREFIX)?;
        match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping malformed stream record: {}", e);
                None
            }
        }
    }
}

impl<R: Read> Iterator for StreamDecoder<R> {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        loop {
            let line = self.next_line()?;
            if let Some(event) = Self::decode_line(&line) {
                return Some(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all(input: &str) -> Vec<StreamEvent> {
        StreamDecoder::new(Cursor::new(input.as_bytes().to_vec())).collect()
    }

    #[test]
    fn test_decode_text_events_in_order() {
        let events = decode_all(
            "data: {\"type\":\"text\",\"content\":\"Hel\"}\n\
             data: {\"type\":\"text\",\"content\":\"lo\"}\n",
        );
        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (StreamEvent::Text { content: a }, StreamEvent::Text { content: b }) => {
                assert_eq!(a, "Hel");
                assert_eq!(b, "lo");
            }
            _ => panic!("expected two text events"),
        }
    }

    #[test]
    fn test_decode_tool_calls() {
        let events = decode_all(
            "data: {\"type\":\"tool_calls\",\"tool_calls\":[{\"name\":\"refresh_inbox\",\"arguments\":{}}]}\n",
        );
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::ToolCalls { tool_calls } => {
                assert_eq!(tool_calls.len(), 1);
                assert_eq!(tool_calls[0].name, "refresh_inbox");
            }
            _ => panic!("expected tool_calls event"),
        }
    }

    #[test]
    fn test_decode_meta_and_error() {
        let events = decode_all(
            "data: {\"type\":\"meta\",\"conversationId\":\"c1\"}\n\
             data: {\"type\":\"error\",\"error\":\"rate limited\"}\n",
        );
        assert_eq!(events.len(), 2);
        match &events[0] {
            StreamEvent::Meta { conversation_id } => {
                assert_eq!(conversation_id.as_deref(), Some("c1"));
            }
            _ => panic!("expected meta event"),
        }
        match &events[1] {
            StreamEvent::Error { error } => assert_eq!(error, "rate limited"),
            _ => panic!("expected error event"),
        }
    }

    #[test]
    fn test_malformed_record_skipped() {
        let events = decode_all(
            "data: {\"type\":\"text\",\"content\":\"a\"}\n\
             data: {not json\n\
             data: {\"type\":\"text\",\"content\":\"b\"}\n",
        );
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_non_prefixed_lines_ignored() {
        let events = decode_all(
            ": keepalive\n\
             \n\
             data: {\"type\":\"text\",\"content\":\"a\"}\n",
        );
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_record_split_across_reads() {
        // A reader that hands out one byte at a time forces the decoder to
        // buffer partial records.
        struct OneByte(Cursor<Vec<u8>>);
        impl Read for OneByte {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let n = 1.min(buf.len());
                self.0.read(&mut buf[..n])
            }
        }

        let input = b"data: {\"type\":\"text\",\"content\":\"hello\"}\n".to_vec();
        let events: Vec<StreamEvent> =
            StreamDecoder::new(OneByte(Cursor::new(input))).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Text { content } => assert_eq!(content, "hello"),
            _ => panic!("expected text event"),
        }
    }

    #[test]
    fn test_final_unterminated_line_flushed() {
        let events = decode_all("data: {\"type\":\"text\",\"content\":\"tail\"}");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = decode_all("data: {\"type\":\"text\",\"content\":\"a\"}\r\n");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_empty_stream() {
        let events = decode_all("");
        assert!(events.is_empty());
    }
}
