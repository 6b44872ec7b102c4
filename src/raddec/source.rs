//! # Event Source
//!
//! Inbound stream of flattened detection events, one JSON object per line.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::info;

use super::event::DetectionEvent;
use crate::error::{LoggerError, Result};

/// Configuration value selecting standard input as the event source
pub const STDIN_SOURCE: &str = "stdin";

/// Trait for inbound detection event streams
#[async_trait]
pub trait EventSource: Send {
    /// Waits for the next event.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. Must be cancel safe:
    /// the pipeline polls it inside `tokio::select!`.
    async fn next_event(&mut self) -> Result<Option<DetectionEvent>>;
}

/// Reads events from JSON lines on any buffered async reader
pub struct JsonLinesEventSource<R> {
    lines: Lines<R>,
    line_number: u64,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for JsonLinesEventSource<R> {
    async fn next_event(&mut self) -> Result<Option<DetectionEvent>> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| LoggerError::EventSource(format!("Failed to read event: {}", e)))?;

            let Some(line) = line else {
                return Ok(None);
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return serde_json::from_str(trimmed).map(Some).map_err(|e| {
                LoggerError::MalformedEvent(format!("line {}: {}", self.line_number, e))
            });
        }
    }
}

/// Open the configured event source
///
/// # Arguments
///
/// * `source` - `"stdin"` or a path to a file or FIFO
///
/// # Errors
///
/// Returns error if the path cannot be opened
pub async fn open_event_source(source: &str) -> Result<Box<dyn EventSource>> {
    if source == STDIN_SOURCE {
        info!("Reading detection events from stdin");
        return Ok(Box::new(JsonLinesEventSource::new(BufReader::new(
            tokio::io::stdin(),
        ))));
    }

    let file = tokio::fs::File::open(source)
        .await
        .map_err(|e| LoggerError::EventSource(format!("Failed to open {}: {}", source, e)))?;
    info!("Reading detection events from {}", source);
    Ok(Box::new(JsonLinesEventSource::new(BufReader::new(file))))
}
