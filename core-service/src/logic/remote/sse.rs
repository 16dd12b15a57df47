//! Incremental `text/event-stream` decoder
//!
//! Bytes arrive in arbitrary chunks; complete events are returned as the
//! concatenated `data:` payload. Comments, `event:`, `id:` and `retry:`
//! fields are ignored.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // keep split UTF-8 sequences until the rest arrives
        self.pending.extend_from_slice(chunk);
        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // genuinely invalid bytes: let the lossy conversion replace them
            Err(e) if e.error_len().is_some() => self.pending.len(),
            Err(e) => e.valid_up_to(),
        };
        let text: Vec<u8> = self.pending.drain(..valid_up_to).collect();
        self.buffer.push_str(&String::from_utf8_lossy(&text));
        // normalise after appending so a "\r" ending one chunk pairs with the next "\n"
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..end + 2).collect();
            if let Some(data) = Self::data_of(&block) {
                events.push(data);
            }
        }
        events
    }

    /// Flush a trailing event the server closed without a blank line
    pub fn finish(&mut self) -> Option<String> {
        let block = std::mem::take(&mut self.buffer);
        self.pending.clear();
        Self::data_of(&block)
    }

    fn data_of(block: &str) -> Option<String> {
        let lines: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.strip_prefix(' ').unwrap_or(data))
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}
