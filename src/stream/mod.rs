//! Stream handling for the raw device telemetry.
//!
//! This module contains:
//! - Line framing over arbitrarily chunked bytes
//! - Record parsing into typed readings and status lines

pub mod framer;
pub mod parser;

pub use framer::LineFramer;
pub use parser::{parse_line, parse_reading, Reading, Record, StatusLine};
