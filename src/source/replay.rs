//! Replay byte source for recorded captures.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use super::ByteSource;
use crate::error::SourceError;

/// A byte source that replays a recorded capture from memory or a file.
///
/// Useful for driving the pipeline without hardware: integration tests,
/// demos, and postmortem analysis of captured sensor sessions. Reports
/// [`SourceError::Closed`] once the capture is exhausted, which ends the
/// pipeline cleanly.
#[derive(Debug)]
pub struct ReplaySource {
    data: Cursor<Vec<u8>>,
    description: String,
}

impl ReplaySource {
    /// Replay an in-memory byte capture.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, description: &str) -> Self {
        Self {
            data: Cursor::new(bytes.into()),
            description: format!("replay: {description}"),
        }
    }

    /// Replay a capture file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Ok(Self {
            data: Cursor::new(bytes),
            description: format!("replay: {}", path.display()),
        })
    }

    fn remaining(&self) -> usize {
        self.data.get_ref().len().saturating_sub(self.data.position() as usize)
    }
}

impl ByteSource for ReplaySource {
    fn bytes_available(&mut self) -> Result<usize, SourceError> {
        match self.remaining() {
            0 => Err(SourceError::Closed),
            n => Ok(n),
        }
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        match self.data.read(buf)? {
            0 => Err(SourceError::Closed),
            n => Ok(n),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_replay_from_bytes() {
        let mut source = ReplaySource::from_bytes(&b"1,2,3,4\n"[..], "test");
        assert_eq!(source.bytes_available().unwrap(), 8);

        let mut buf = [0u8; 256];
        let n = source.read_chunk(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"1,2,3,4\n");

        assert!(matches!(source.bytes_available(), Err(SourceError::Closed)));
    }

    #[test]
    fn test_replay_chunked_reads() {
        let mut source = ReplaySource::from_bytes(&b"abcdef"[..], "test");
        let mut buf = [0u8; 4];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 4);
        assert_eq!(source.bytes_available().unwrap(), 2);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 2);
        assert!(matches!(source.read_chunk(&mut buf), Err(SourceError::Closed)));
    }

    #[test]
    fn test_replay_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "12.3,410,21.5,45.0\n").unwrap();
        file.flush().unwrap();

        let mut source = ReplaySource::from_file(file.path()).unwrap();
        assert_eq!(source.bytes_available().unwrap(), 19);
        assert!(source.description().starts_with("replay: "));
    }

    #[test]
    fn test_replay_missing_file() {
        let err = ReplaySource::from_file("/nonexistent/capture.bin").unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
