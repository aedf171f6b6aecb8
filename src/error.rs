//! Error types for the ingestion pipeline.
//!
//! Only source-level failures are represented here. Malformed lines, decode
//! anomalies, and "no bytes yet" gaps are absorbed inside the pipeline and
//! never surface as errors.

use thiserror::Error;

/// Failures surfaced by a byte source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The byte source could not be opened (bad identifier, device busy).
    /// Fatal: the pipeline never enters streaming.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Unrecoverable I/O failure while streaming (device unplugged,
    /// broken pipe). Fatal: the pipeline faults and terminates.
    #[error("byte source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended cleanly (a replay capture was exhausted).
    #[error("byte source closed")]
    Closed,
}

impl SourceError {
    /// True for errors that should take the process down with a
    /// non-zero status, as opposed to a clean end of stream.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SourceError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_is_not_fatal() {
        assert!(!SourceError::Closed.is_fatal());
        assert!(SourceError::Io(std::io::Error::other("gone")).is_fatal());
    }

    #[test]
    fn test_open_error_names_port() {
        let err = SourceError::Open {
            port: "/dev/ttyUSB7".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
        };
        assert!(err.to_string().contains("/dev/ttyUSB7"));
    }
}
