//! Per-file word counting.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tokio_util::sync::CancellationToken;
use wordfreq_core::{FileReadError, WordCounts, normalized_words};

/// Read buffer size for file handles.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Initial capacity of the reusable line buffer.
const INITIAL_LINE_CAPACITY: usize = 4096;

/// Counts gathered from a single file.
#[derive(Debug, Clone, Default)]
pub struct FileCounts {
    /// Number of lines read.
    pub lines: u64,
    /// Number of bytes read, terminators included.
    pub bytes: u64,
    /// Word counts local to this file.
    pub counts: WordCounts,
}

/// Open a file and count its words line by line.
pub fn process_file(
    path: &Path,
    max_line_len: usize,
    cancel: &CancellationToken,
) -> Result<FileCounts, FileReadError> {
    let file = File::open(path).map_err(|source| FileReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    count_lines(
        BufReader::with_capacity(READ_BUFFER_SIZE, file),
        path,
        max_line_len,
        cancel,
    )
}

/// Count words from any buffered reader.
///
/// Memory is bounded by `max_line_len`: a line whose content (without its
/// `\n` or `\r\n` terminator) is longer fails the whole file with
/// [`FileReadError::LineTooLong`]. Invalid UTF-8 is decoded lossily.
pub fn count_lines<R: BufRead>(
    mut reader: R,
    path: &Path,
    max_line_len: usize,
    cancel: &CancellationToken,
) -> Result<FileCounts, FileReadError> {
    let mut result = FileCounts::default();
    let mut buf = Vec::with_capacity(max_line_len.min(INITIAL_LINE_CAPACITY));
    // Room for the longest allowed line plus "\r\n".
    let read_limit = max_line_len as u64 + 2;

    loop {
        if cancel.is_cancelled() {
            return Err(FileReadError::Interrupted {
                path: path.to_path_buf(),
            });
        }

        buf.clear();
        let read = reader
            .by_ref()
            .take(read_limit)
            .read_until(b'\n', &mut buf)
            .map_err(|source| FileReadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }

        result.lines += 1;
        result.bytes += read as u64;

        let line = trim_terminator(&buf);
        if line.len() > max_line_len {
            return Err(FileReadError::LineTooLong {
                path: path.to_path_buf(),
                line: result.lines,
                limit: max_line_len,
            });
        }

        let text = String::from_utf8_lossy(line);
        for word in normalized_words(&text) {
            *result.counts.entry(word).or_insert(0) += 1;
        }
    }

    Ok(result)
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
