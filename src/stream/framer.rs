//! Newline framing for the raw device stream.
//!
//! The transport hands over chunks of whatever size the OS had buffered, so a
//! single telemetry record can be split across any number of reads. The
//! framer keeps the trailing partial line between reads and only emits lines
//! once their delimiter has arrived.

/// Line delimiter used by the wearable's firmware.
const DELIMITER: u8 = b'\n';

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Bytes received after the last delimiter
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and collect every line it completes.
    ///
    /// Framing happens on bytes so a chunk boundary inside a multi-byte
    /// UTF-8 character cannot corrupt the line it belongs to.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == DELIMITER) {
            self.pending.extend_from_slice(&rest[..pos]);
            lines.push(decode(&self.pending));
            self.pending.clear();
            rest = &rest[pos + 1..];
        }

        self.pending.extend_from_slice(rest);
        lines
    }

    /// Feed a chunk of text.
    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.push(chunk.as_bytes())
    }

    /// Finalize the stream, returning the trailing partial line if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = decode(&self.pending);
        self.pending.clear();
        Some(line)
    }

    /// Drop any partial line (new session).
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Number of bytes waiting for a delimiter.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
