//! Transports that deliver the raw device byte stream.
//!
//! The physical link is an external collaborator: the pipeline only needs
//! something that can be opened at a baud rate, yields bytes until it ends,
//! and can be closed. Failures to open surface as `TransportError` and keep
//! the session disconnected.

pub mod device;
pub mod scripted;
pub mod synthetic;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

pub use device::{DeviceTransport, StdinTransport};
pub use scripted::{ScriptedChunk, ScriptedTransport};
pub use synthetic::{synthetic_ecg, SyntheticEcg};

/// Byte stream produced by an opened transport.
pub type TransportStream = Box<dyn AsyncRead + Send + Unpin>;

/// Source of the raw telemetry stream.
#[async_trait]
pub trait Transport: Send {
    /// Short human-readable name for logs.
    fn describe(&self) -> String;

    /// Open the link at the given baud rate.
    async fn open(&mut self, baud_rate: u32) -> Result<TransportStream, TransportError>;

    /// Release the link. Called after the reader has been dropped.
    async fn close(&mut self) {}
}

/// Errors raised by transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No such device or capability on this host
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
    /// The device exists but refused to open (busy, permissions)
    #[error("Failed to open transport: {0}")]
    OpenFailure(String),
    /// The stream failed after opening
    #[error("Transport read failed: {0}")]
    Read(#[from] std::io::Error),
}
