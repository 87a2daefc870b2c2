//! In-memory transport replaying a fixed script of chunks.
//!
//! Used for deterministic playback in tests and for the `simulate` command.
//! Each open replays the whole script from the start.

use crate::transport::{Transport, TransportError, TransportStream};
use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::task::JoinHandle;

/// Pipe capacity between the feeder task and the reader.
const PIPE_CAPACITY: usize = 64 * 1024;

/// One write to the stream, delivered after `delay`.
#[derive(Debug, Clone)]
pub struct ScriptedChunk {
    pub delay: Duration,
    pub bytes: Vec<u8>,
}

impl ScriptedChunk {
    pub fn new(delay: Duration, text: impl Into<String>) -> Self {
        Self {
            delay,
            bytes: text.into().into_bytes(),
        }
    }

    /// A chunk delivered immediately.
    pub fn now(text: impl Into<String>) -> Self {
        Self::new(Duration::ZERO, text)
    }
}

/// Replays scripted chunks through an in-memory pipe.
#[derive(Debug)]
pub struct ScriptedTransport {
    chunks: Vec<ScriptedChunk>,
    /// Keep the stream open after the script instead of ending it
    hold_open: bool,
    /// Fail the read after the script instead of ending it
    fail_read_at_end: bool,
    fail_next_open: Option<TransportError>,
    feeder: Option<JoinHandle<()>>,
    open_count: usize,
}

impl ScriptedTransport {
    pub fn new(chunks: Vec<ScriptedChunk>) -> Self {
        Self {
            chunks,
            hold_open: false,
            fail_read_at_end: false,
            fail_next_open: None,
            feeder: None,
            open_count: 0,
        }
    }

    /// Keep the stream open once the script is exhausted, like a silent device.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Fail the read once the script is exhausted, like an unplugged device.
    ///
    /// Takes precedence over `hold_open`.
    pub fn fail_read_at_end(mut self) -> Self {
        self.fail_read_at_end = true;
        self
    }

    /// Make the next `open` fail with `error`.
    pub fn fail_next_open(&mut self, error: TransportError) {
        self.fail_next_open = Some(error);
    }

    /// How many times the transport has been opened successfully.
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    fn stop_feeder(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn describe(&self) -> String {
        format!("scripted ({} chunks)", self.chunks.len())
    }

    async fn open(&mut self, _baud_rate: u32) -> Result<TransportStream, TransportError> {
        if let Some(error) = self.fail_next_open.take() {
            return Err(error);
        }
        self.stop_feeder();

        let (reader, mut writer) = tokio::io::duplex(PIPE_CAPACITY);
        let chunks = self.chunks.clone();
        let hold_open = self.hold_open && !self.fail_read_at_end;

        self.feeder = Some(tokio::spawn(async move {
            for chunk in chunks {
                if !chunk.delay.is_zero() {
                    tokio::time::sleep(chunk.delay).await;
                }
                if writer.write_all(&chunk.bytes).await.is_err() {
                    // Reader went away
                    return;
                }
            }
            if hold_open {
                std::future::pending::<()>().await;
            }
        }));

        self.open_count += 1;
        Ok(Box::new(ScriptedReader {
            inner: reader,
            fail_at_end: self.fail_read_at_end,
        }))
    }

    async fn close(&mut self) {
        self.stop_feeder();
    }
}

/// Read half of the pipe; optionally turns end of stream into an I/O error.
struct ScriptedReader {
    inner: DuplexStream,
    fail_at_end: bool,
}

impl AsyncRead for ScriptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        match Pin::new(&mut self.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(()))
                if self.fail_at_end && buf.remaining() > 0 && buf.filled().len() == before =>
            {
                Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "scripted device unplugged",
                )))
            }
            other => other,
        }
    }
}

impl Drop for ScriptedTransport {
    fn drop(&mut self) {
        self.stop_feeder();
    }
}
