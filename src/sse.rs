//! Server-Sent Events parsing for streamed chat completions.
//!
//! The completions endpoint streams:
//! - `data: {json chunk}` lines carrying `choices[0].delta.content`
//! - empty lines ending each event
//! - `: keep-alive` comments
//! - a final `data: [DONE]`

use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use thiserror::Error;

use crate::error::{DashError, DashResult, NetworkError};

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    Event(String),
    Data(String),
    Empty,
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// A text increment.
    Delta(String),
    /// The model reported an error mid-stream.
    Error(String),
    Done,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SseParseError {
    #[error("invalid JSON in SSE data: {message}")]
    InvalidJson { message: String },
}

impl From<SseParseError> for DashError {
    fn from(err: SseParseError) -> Self {
        NetworkError::InvalidResponse {
            message: err.to_string(),
        }
        .into()
    }
}

#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    /// Non-streaming responses carry `message` instead of `delta`.
    #[serde(default)]
    message: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }
    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }
    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }
    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }
    SseLine::Comment(line.to_string())
}

/// Decode one event's data payload.
pub fn parse_chunk(data: &str) -> Result<Option<SseEvent>, SseParseError> {
    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }

    let chunk: Chunk = serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
        message: e.to_string(),
    })?;

    if let Some(error) = chunk.error {
        return Ok(Some(SseEvent::Error(error.message)));
    }

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.or(choice.message))
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty());

    Ok(text.map(SseEvent::Delta))
}

/// Stateful parser that accumulates `data:` lines until a blank line.
#[derive(Debug, Default)]
pub struct SseParser {
    data_buffer: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(Some(event))` when a line completes an event carrying text,
    /// `[DONE]` or an error.
    pub fn feed_line(&mut self, line: &str) -> Result<Option<SseEvent>, SseParseError> {
        match parse_sse_line(line) {
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                Ok(None)
            }
            SseLine::Empty => self.flush(),
            SseLine::Event(_) | SseLine::Comment(_) => Ok(None),
        }
    }

    /// Emit whatever is buffered, e.g. when the body ends without a blank line.
    pub fn flush(&mut self) -> Result<Option<SseEvent>, SseParseError> {
        if self.data_buffer.is_empty() {
            return Ok(None);
        }
        let data = self.data_buffer.join("\n");
        self.data_buffer.clear();
        parse_chunk(&data)
    }
}

/// Turn a streamed HTTP body into SSE events. Stops after [`SseEvent::Done`].
pub fn event_stream<S>(body: S) -> impl Stream<Item = DashResult<SseEvent>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin + Send + 'static,
{
    stream::unfold(
        (body, SseParser::new(), Vec::<u8>::new(), false),
        |(mut body, mut parser, mut buffer, mut finished)| async move {
            if finished {
                return None;
            }
            loop {
                if let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=newline).collect();
                    let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
                    match parser.feed_line(line.trim_end_matches('\r')) {
                        Ok(Some(event)) => {
                            finished = event == SseEvent::Done;
                            return Some((Ok(event), (body, parser, buffer, finished)));
                        }
                        Ok(None) => continue,
                        Err(e) => return Some((Err(e.into()), (body, parser, buffer, finished))),
                    }
                }

                match body.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        return Some((Err(e.into()), (body, parser, buffer, true)));
                    }
                    None => {
                        let tail = String::from_utf8_lossy(&buffer).to_string();
                        buffer.clear();
                        if !tail.trim().is_empty() {
                            let _ = parser.feed_line(tail.trim_end_matches('\r'));
                        }
                        return match parser.flush() {
                            Ok(Some(event)) => Some((Ok(event), (body, parser, buffer, true))),
                            Ok(None) => None,
                            Err(e) => Some((Err(e.into()), (body, parser, buffer, true))),
                        };
                    }
                }
            }
        },
    )
}
