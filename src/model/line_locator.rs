//! Streaming lookup of a single line in a JSONL file
//!
//! Line boundary rule (shared with the rewriter):
//! - LF terminates a line
//! - a CR immediately before LF belongs to the terminator
//! - a lone CR is content
//! - a trailing LF does not start a new line
//!
//! Only the current and the previous line are held in memory, so memory use is
//! bounded by line length rather than file size.

use crate::error::{RecordError, Result};
use std::io;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read buffer size for streaming
const CHUNK_SIZE: usize = 64 * 1024;

/// A line read from a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedLine {
    /// Line content without its terminator
    pub content: String,
    /// 1-based index of the line actually returned
    pub line: usize,
}

/// Return the content of line `target_line` (1-based) of `path`
///
/// A target of 0 is treated as 1. A target past the end of the file yields the
/// last line and its index. An empty file yields an empty line 1.
pub async fn locate(path: &Path, target_line: usize) -> Result<LocatedLine> {
    let target_line = target_line.max(1);

    if !tokio::fs::try_exists(path).await? {
        return Err(RecordError::NotFound(path.to_path_buf()));
    }

    let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RecordError::NotFound(path.to_path_buf()),
        _ => RecordError::Io(e),
    })?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);

    let mut current = Vec::new();
    let mut previous = Vec::new();
    let mut index = 0usize;

    loop {
        current.clear();
        let read = reader.read_until(b'\n', &mut current).await?;
        if read == 0 {
            break;
        }
        index += 1;
        strip_terminator(&mut current);

        if index == target_line {
            tracing::trace!(path = %path.display(), line = index, "located line");
            return Ok(LocatedLine {
                content: decode(current),
                line: index,
            });
        }
        std::mem::swap(&mut current, &mut previous);
    }

    if index == 0 {
        return Ok(LocatedLine {
            content: String::new(),
            line: 1,
        });
    }

    tracing::debug!(
        path = %path.display(),
        requested = target_line,
        last = index,
        "requested line past end of file, returning last line"
    );
    Ok(LocatedLine {
        content: decode(previous),
        line: index,
    })
}

/// Drop a trailing LF and, only then, a CR right before it
fn strip_terminator(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
