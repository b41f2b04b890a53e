pub mod api;

pub use api::{ApiMessage, ChatChunk, Delta, GenerationEvent, MessageDelta, StreamEvent};
