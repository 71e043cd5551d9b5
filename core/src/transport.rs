//! Framing between the host and the agent
//!
//! The pump only sees [`RequestSource`] and [`ResponseSink`]. The shipped
//! framing is newline-delimited JSON: one message object per line.

use async_trait::async_trait;
use log::trace;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AgentError, Result};
use crate::protocol::{Request, Response};

/// Inbound half of the host channel
#[async_trait]
pub trait RequestSource: Send {
    /// Next request, or `None` once the host closed its side
    async fn next_request(&mut self) -> Result<Option<Request>>;
}

/// Outbound half of the host channel
#[async_trait]
pub trait ResponseSink: Send {
    /// Write one response
    async fn send(&mut self, response: &Response) -> Result<()>;

    /// Flush and release the channel; no response follows
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<'a, T> RequestSource for &'a mut T
where
    T: RequestSource + ?Sized,
{
    async fn next_request(&mut self) -> Result<Option<Request>> {
        (**self).next_request().await
    }
}

/// Reads one JSON request per line
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    frames: u64,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            frames: 0,
        }
    }

    /// Number of non-empty frames read so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[async_trait]
impl<R> RequestSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_request(&mut self) -> Result<Option<Request>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line).await? == 0 {
                return Ok(None);
            }

            let frame = self.line.trim();
            if frame.is_empty() {
                continue;
            }

            self.frames += 1;
            trace!("frame {}: {} bytes", self.frames, frame.len());
            return serde_json::from_str(frame)
                .map(Some)
                .map_err(|source| AgentError::Decode {
                    frame: self.frames,
                    source,
                });
        }
    }
}

/// Writes one JSON response per line
pub struct JsonLinesSink<W> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: Vec::new(),
        }
    }

    /// Consume the sink and return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> ResponseSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, response: &Response) -> Result<()> {
        self.buffer.clear();
        serde_json::to_writer(&mut self.buffer, response).map_err(AgentError::Encode)?;
        self.buffer.push(b'\n');

        self.writer.write_all(&self.buffer).await?;
        // The host waits on each response; do not sit on it
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}
