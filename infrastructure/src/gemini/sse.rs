//! Server-Sent Events line decoder.
//!
//! Gemini streams `streamGenerateContent?alt=sse` responses as SSE where
//! every event carries one JSON chunk in its `data:` field(s). The decoder
//! is fed one line at a time and yields the joined data of each complete
//! event.

/// Incremental SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    data: String,
    has_data: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator). Returns the event data when
    /// the line completes an event.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.take();
        }

        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            if self.has_data {
                self.data.push('\n');
            }
            self.data.push_str(value);
            self.has_data = true;
        }
        // event:, id:, retry: and comments carry nothing we use
        None
    }

    /// Flush an event left open when the stream ended without a blank line.
    pub fn finish(mut self) -> Option<String> {
        self.take()
    }

    fn take(&mut self) -> Option<String> {
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(std::mem::take(&mut self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> Vec<String> {
        let mut decoder = SseDecoder::new();
        let mut events: Vec<String> = input.lines().filter_map(|l| decoder.push_line(l)).collect();
        events.extend(decoder.finish());
        events
    }

    #[test]
    fn decodes_consecutive_events() {
        let events = decode("data: {\"a\":1}\n\ndata: {\"a\":2}\n\n");
        assert_eq!(events, vec!["{\"a\":1}", "{\"a\":2}"]);
    }

    #[test]
    fn joins_multi_line_data() {
        let events = decode("data: first\ndata: second\n\n");
        assert_eq!(events, vec!["first\nsecond"]);
    }

    #[test]
    fn ignores_other_fields_and_comments() {
        let events = decode(": keep-alive\nevent: message\nid: 7\ndata: x\n\n");
        assert_eq!(events, vec!["x"]);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let events = decode("data: x\r\n\r\n");
        assert_eq!(events, vec!["x"]);
    }

    #[test]
    fn flushes_unterminated_event() {
        assert_eq!(decode("data: tail"), vec!["tail"]);
    }

    #[test]
    fn blank_lines_without_data_yield_nothing() {
        assert!(decode("\n\n\n").is_empty());
    }
}
