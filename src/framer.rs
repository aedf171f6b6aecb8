//! Line framing over an unreliable byte stream.
//!
//! Serial devices deliver bytes in arbitrary chunks: a read may end in the
//! middle of a line, contain several lines, or carry invalid UTF-8 from a
//! glitched transfer. [`LineFramer`] accumulates chunks and yields complete,
//! trimmed text lines, discarding blank lines and `#` diagnostics before they
//! ever reach the parser.

/// Cap on a single accumulated line. Anything longer is firmware garbage
/// (an unterminated debug dump, line noise) and is discarded up to the
/// next delimiter.
pub const DEFAULT_MAX_LINE: usize = 4096;

/// Accumulates raw bytes into discrete text lines.
///
/// Feed chunks in arrival order with [`push_chunk`](Self::push_chunk); bytes
/// after the last delimiter are carried over to the next call, so the framer
/// is restartable at any chunk boundary. Invalid UTF-8 is replaced rather
/// than failing the stream.
#[derive(Debug)]
pub struct LineFramer {
    carry: Vec<u8>,
    max_line: usize,
    /// Set once the current line has overflowed `max_line`; the remainder
    /// of the line is discarded up to the next delimiter.
    overflowed: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Create a framer with the default line cap.
    pub fn new() -> Self {
        Self::with_max_line(DEFAULT_MAX_LINE)
    }

    /// Create a framer that discards lines longer than `max_line` bytes.
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            carry: Vec::new(),
            max_line: max_line.max(1),
            overflowed: false,
        }
    }

    /// Feed one chunk of bytes, returning the complete lines it finished.
    ///
    /// Lines are decoded lossily, trimmed of surrounding whitespace
    /// (including `\r` from CRLF endings), and filtered: blank lines and
    /// `#`-prefixed comment lines are dropped here, at the framing level.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in chunk {
            if byte == b'\n' {
                if let Some(line) = self.take_line() {
                    lines.push(line);
                }
            } else {
                if self.carry.len() >= self.max_line {
                    self.overflowed = true;
                    self.carry.clear();
                }
                if !self.overflowed {
                    self.carry.push(byte);
                }
            }
        }

        lines
    }

    /// Complete the pending line, applying decode, trim, and filters.
    fn take_line(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.carry);

        if std::mem::take(&mut self.overflowed) {
            return None;
        }

        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        Some(line)
    }

    /// Number of bytes buffered waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut framer = LineFramer::new();
        let lines = framer.push_chunk(b"12.3,410,21.5,45.0\n");
        assert_eq!(lines, vec!["12.3,410,21.5,45.0"]);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.push_chunk(b"12.3,41").is_empty());
        assert_eq!(framer.pending(), 7);
        let lines = framer.push_chunk(b"0,21.5,45.0\n13.1,");
        assert_eq!(lines, vec!["12.3,410,21.5,45.0"]);
        assert_eq!(framer.pending(), 5);
    }

    #[test]
    fn test_crlf_endings() {
        let mut framer = LineFramer::new();
        let lines = framer.push_chunk(b"1,2,3,4\r\n5,6,7,8\r\n");
        assert_eq!(lines, vec!["1,2,3,4", "5,6,7,8"]);
    }

    #[test]
    fn test_blank_and_comment_lines_filtered() {
        let mut framer = LineFramer::new();
        let lines = framer.push_chunk(b"\n# calibration ok\n  \n1,2,3,4\n");
        assert_eq!(lines, vec!["1,2,3,4"]);
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let mut framer = LineFramer::new();
        let lines = framer.push_chunk(b"12.3,\xff\xfe,21.5,45.0\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains('\u{FFFD}'));
    }

    #[test]
    fn test_overlong_line_discarded() {
        let mut framer = LineFramer::with_max_line(8);
        let lines = framer.push_chunk(b"0123456789abcdef\n1,2,3,4\n");
        assert_eq!(lines, vec!["1,2,3,4"]);
    }

    #[test]
    fn test_overflow_spanning_chunks() {
        let mut framer = LineFramer::with_max_line(8);
        assert!(framer.push_chunk(b"0123456789").is_empty());
        assert!(framer.push_chunk(b"abcdef").is_empty());
        let lines = framer.push_chunk(b"\n1,2,3,4\n");
        assert_eq!(lines, vec!["1,2,3,4"]);
    }

    #[test]
    fn test_multiple_lines_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.push_chunk(b"1,2,3,4\n#note\n5,6,7,8\n9,10,11,12\n");
        assert_eq!(lines, vec!["1,2,3,4", "5,6,7,8", "9,10,11,12"]);
    }
}
