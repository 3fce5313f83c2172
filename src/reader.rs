//! Line decoding over an open log file.

use crate::error::{Error, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Longest line held back waiting for its terminator.
pub(crate) const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Result of asking the reader for the next line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    /// A complete, newline-terminated line with the terminator stripped,
    /// or a [`MAX_LINE_LENGTH`] chunk of an unterminated one.
    Line(String),
    /// No complete line is available yet.
    CaughtUp,
}

/// Buffered reader that only ever yields whole lines.
///
/// Bytes read after the last newline are held back until a later call
/// completes the line, so a writer caught mid-line never produces a
/// truncated record. A held line that reaches the length limit is emitted
/// as-is so memory stays bounded.
pub(crate) struct LineReader {
    reader: BufReader<File>,
    pending: Vec<u8>,
    offset: u64,
    max_line_length: usize,
}

impl LineReader {
    /// Opens `path` and positions the reader at `offset`.
    pub(crate) async fn open_at(path: &Path, offset: u64) -> Result<Self> {
        let mut file = File::open(path).await?;

        if offset > 0 {
            let size = file.metadata().await?.len();
            if offset > size {
                return Err(Error::SeekOutOfRange {
                    path: path.display().to_string(),
                    offset,
                    size,
                });
            }
            file.seek(std::io::SeekFrom::Start(offset)).await?;
        }

        Ok(Self::new(file, offset))
    }

    pub(crate) fn new(file: File, offset: u64) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
            pending: Vec::new(),
            offset,
            max_line_length: MAX_LINE_LENGTH,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub(crate) async fn next_line(&mut self) -> Result<ReadOutcome> {
        let limit = self.max_line_length.saturating_sub(self.pending.len()) as u64;
        (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.pending)
            .await?;

        if self.pending.last() == Some(&b'\n') {
            let mut bytes = std::mem::take(&mut self.pending);
            self.offset += bytes.len() as u64;
            bytes.pop();
            return Ok(ReadOutcome::Line(decode(bytes)));
        }

        if self.pending.len() >= self.max_line_length {
            return Ok(self.take_pending().map_or(ReadOutcome::CaughtUp, ReadOutcome::Line));
        }

        Ok(ReadOutcome::CaughtUp)
    }

    /// Gives up waiting for a terminator and returns the held bytes, if any.
    pub(crate) fn take_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }

        let bytes = std::mem::take(&mut self.pending);
        self.offset += bytes.len() as u64;
        Some(decode(bytes))
    }

    /// Byte offset where the next complete line starts.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes pulled from the file so far, including a held partial line.
    pub(crate) fn consumed(&self) -> u64 {
        self.offset + self.pending.len() as u64
    }
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
