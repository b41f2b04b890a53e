use super::logging::emit_sse_parse_error;
use crate::types::{ChatChunk, GenerationEvent, StreamEvent};
use anyhow::Result;

/// Incremental server-sent-events decoder for both supported protocols.
///
/// Anthropic frames carry an `event:` line; OpenAI frames only carry `data:`.
#[derive(Default)]
pub struct StreamParser {
    buffer: String,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<GenerationEvent>> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut events = Vec::new();
        let mut start = 0;

        while let Some(end) = self.buffer[start..].find("\n\n") {
            let event_end = start + end + 2;
            let event_text = &self.buffer[start..event_end];

            let mut event_type = None;
            let mut data = None;

            for line in event_text.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    event_type = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data = Some(rest.trim().to_string());
                }
            }

            if let Some(json_data) = data {
                decode_frame(event_type.as_deref(), &json_data, &mut events);
            }

            start = event_end;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(events)
    }

    pub fn flush(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

fn decode_frame(event_type: Option<&str>, json_data: &str, events: &mut Vec<GenerationEvent>) {
    if json_data == "[DONE]" {
        events.push(GenerationEvent::Done);
        return;
    }

    if event_type.is_some() {
        match serde_json::from_str::<StreamEvent>(json_data) {
            Ok(StreamEvent::ContentBlockDelta { delta, .. }) => {
                if let Some(text) = delta.text.filter(|text| !text.is_empty()) {
                    events.push(GenerationEvent::TextDelta(text));
                }
            }
            Ok(StreamEvent::MessageDelta { delta }) => {
                if let Some(reason) = delta.stop_reason {
                    events.push(GenerationEvent::StopReason(reason));
                }
            }
            Ok(StreamEvent::MessageStop) => events.push(GenerationEvent::Done),
            Ok(_) => {}
            Err(error) => emit_sse_parse_error(event_type, json_data, &error),
        }
        return;
    }

    match serde_json::from_str::<ChatChunk>(json_data) {
        Ok(chunk) => {
            for choice in chunk.choices {
                if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
                    events.push(GenerationEvent::TextDelta(text));
                }
                if let Some(reason) = choice.finish_reason {
                    events.push(GenerationEvent::StopReason(reason));
                }
            }
        }
        Err(error) => emit_sse_parse_error(None, json_data, &error),
    }
}
