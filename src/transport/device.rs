//! Device-file and stdin transports.

use crate::transport::{Transport, TransportError, TransportStream};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::OpenOptions;

/// Reads from a character device (e.g. `/dev/ttyUSB0`) or a recorded file.
///
/// Line settings of a serial device (baud rate, raw mode) are configured
/// outside the process, e.g. with `stty`; the requested baud rate is only
/// logged here.
#[derive(Debug, Clone)]
pub struct DeviceTransport {
    path: PathBuf,
}

impl DeviceTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl Transport for DeviceTransport {
    fn describe(&self) -> String {
        format!("device {}", self.path.display())
    }

    async fn open(&mut self, baud_rate: u32) -> Result<TransportStream, TransportError> {
        tracing::debug!("Opening {} at {} baud", self.path.display(), baud_rate);

        let file = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    TransportError::Unavailable(format!("{} not found", self.path.display()))
                }
                _ => TransportError::OpenFailure(format!("{}: {e}", self.path.display())),
            })?;

        Ok(Box::new(file))
    }
}

/// Reads the telemetry stream piped into standard input.
#[derive(Debug, Clone, Default)]
pub struct StdinTransport {
    opened: bool,
}

impl StdinTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for StdinTransport {
    fn describe(&self) -> String {
        "stdin".to_string()
    }

    async fn open(&mut self, _baud_rate: u32) -> Result<TransportStream, TransportError> {
        // Stdin cannot be rewound, so a second session would see a closed stream
        if self.opened {
            return Err(TransportError::Unavailable(
                "stdin was already consumed by a previous session".to_string(),
            ));
        }
        self.opened = true;
        Ok(Box::new(tokio::io::stdin()))
    }
}
