//! Byte source abstraction for the ingestion pipeline.
//!
//! This module provides a trait-based abstraction over the raw byte stream
//! the pipeline consumes: a live serial port in production, a recorded
//! capture in tests and offline runs.

mod replay;
mod serial;

pub use replay::ReplaySource;
pub use serial::SerialSource;

use std::fmt::Debug;

use crate::error::SourceError;

/// A readable, line-oriented byte stream with a non-blocking availability
/// poll.
///
/// The ingestion loop never blocks waiting for a line: it asks
/// [`bytes_available`](Self::bytes_available) first and only reads when data
/// is known to be waiting, yielding control otherwise. "No bytes currently
/// available" is an expected transient state, not an error.
pub trait ByteSource: Send + Debug {
    /// Number of bytes currently waiting to be read, without blocking.
    ///
    /// Returns [`SourceError::Closed`] once the stream has ended cleanly.
    fn bytes_available(&mut self) -> Result<usize, SourceError>;

    /// Read waiting bytes into `buf`, returning how many were read.
    ///
    /// Called only after `bytes_available` reported data waiting. `Ok(0)`
    /// means nothing could be read right now (a transient gap), not end of
    /// stream; the end of a finite stream is [`SourceError::Closed`].
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// Human-readable description of the source, for the status bar.
    fn description(&self) -> &str;
}
