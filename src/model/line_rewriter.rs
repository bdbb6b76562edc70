//! In-place replacement of a single line in a JSONL file
//!
//! Uses the same boundary rule as the locator, so the effective line count here
//! always equals the number of lines the locator can stream. The file is
//! rewritten with LF separators; a trailing newline is kept if it was present.
//!
//! The read-modify-write is not transactional. A concurrent external change to
//! the file between the read and the write is overwritten.

use crate::error::{RecordError, Result};
use std::io;
use std::path::Path;

/// Split file text into lines without their terminators
///
/// Returns the lines and whether the text ended with a line terminator.
pub fn split_lines(text: &str) -> (Vec<&str>, bool) {
    if text.is_empty() {
        return (Vec::new(), false);
    }

    let trailing_newline = text.ends_with('\n');
    let body = if trailing_newline {
        &text[..text.len() - 1]
    } else {
        text
    };

    let segments: Vec<&str> = body.split('\n').collect();
    let last = segments.len() - 1;
    let lines = segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| {
            // Only segments that were followed by LF can end in a CRLF terminator
            if i < last || trailing_newline {
                segment.strip_suffix('\r').unwrap_or(segment)
            } else {
                segment
            }
        })
        .collect();

    (lines, trailing_newline)
}

/// Number of real lines in `text`, ignoring the empty segment after a final LF
pub fn effective_line_count(text: &str) -> usize {
    split_lines(text).0.len()
}

/// Replace line `line_number` (1-based) of `text`, or append when it is one past the end
pub fn replace_line(text: &str, line_number: usize, new_content: &str) -> Result<String> {
    let (mut lines, trailing_newline) = split_lines(text);
    let effective = lines.len();

    if line_number >= 1 && line_number <= effective {
        lines[line_number - 1] = new_content;
    } else if line_number == effective + 1 {
        lines.push(new_content);
    } else {
        return Err(RecordError::OutOfBounds {
            requested: line_number,
            effective,
        });
    }

    let mut updated = lines.join("\n");
    if trailing_newline {
        updated.push('\n');
    }
    Ok(updated)
}

/// Rewrite line `line_number` of the file at `path` with `new_content`
///
/// All other lines keep their content. Fails with `OutOfBounds` before writing
/// anything if the line is neither inside the file nor directly after its end.
pub async fn rewrite(path: &Path, line_number: usize, new_content: &str) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RecordError::NotFound(path.to_path_buf()),
            _ => RecordError::Io(e),
        })?;

    let updated = replace_line(&text, line_number, new_content)?;
    tokio::fs::write(path, updated).await?;

    tracing::debug!(path = %path.display(), line = line_number, "rewrote line");
    Ok(())
}
