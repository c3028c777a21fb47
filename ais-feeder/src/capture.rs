//! Sentence sources for the feeder.
//!
//! Input modes:
//! - `SentenceReader`: capture file, one sentence per line, optionally
//!   prefixed by a whole-second timestamp (`1700000000 !AIVDM,...`)
//! - `LineFramer`:     newline framing over a TCP byte stream
//!
//! Framing only splits on line endings. Multi-fragment AIS messages are passed
//! through fragment by fragment.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use tracing::warn;

/// Longest line accepted from a stream. NMEA caps sentences at 82 chars;
/// anything far beyond that is a broken feed.
pub const MAX_SENTENCE_LEN: usize = 1024;

/// One sentence and the time it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSentence {
    pub text: String,
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Capture file reader
// ---------------------------------------------------------------------------

/// Read AIS sentences from a capture file.
pub struct SentenceReader {
    path: PathBuf,
}

impl SentenceReader {
    pub fn new(path: &Path) -> Self {
        SentenceReader {
            path: path.to_path_buf(),
        }
    }

    /// Read all sentences. Lines without a timestamp prefix use their
    /// zero-based line number as the timestamp.
    pub fn read_all(&self) -> io::Result<Vec<RawSentence>> {
        let content = fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                parse_sentence_line(line).map(|(ts, text)| RawSentence {
                    text: text.to_string(),
                    timestamp: ts.unwrap_or(i as u64),
                })
            })
            .collect())
    }
}

/// Split a capture line into an optional timestamp and the sentence.
///
/// Skips blanks and `#` comments; the sentence must start with `!` or `$`.
pub fn parse_sentence_line(line: &str) -> Option<(Option<u64>, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (ts, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) if head.chars().all(|c| c.is_ascii_digit()) => {
            (head.parse::<u64>().ok(), rest.trim_start())
        }
        _ => (None, line),
    };

    if rest.starts_with('!') || rest.starts_with('$') {
        Some((ts, rest))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Stream framing
// ---------------------------------------------------------------------------

/// Accumulates stream reads and yields complete lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Buffer used as the read target for the next socket read.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Next complete, non-empty line without its terminator.
    ///
    /// If no terminator shows up within `MAX_SENTENCE_LEN` bytes the buffered
    /// data is dropped.
    pub fn next_sentence(&mut self) -> Option<Bytes> {
        loop {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > MAX_SENTENCE_LEN {
                    warn!(bytes = self.buffer.len(), "discarding unterminated input");
                    self.buffer.clear();
                }
                return None;
            };

            let mut line = self.buffer.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(pos - 1);
            }
            if line.is_empty() {
                continue;
            }
            if line.len() > MAX_SENTENCE_LEN {
                warn!(bytes = line.len(), "discarding oversized line");
                continue;
            }
            return Some(line.freeze());
        }
    }

    /// Bytes waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
