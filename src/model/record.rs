//! Conversion between the single-line stored form and the editing form of a record

use crate::error::{RecordError, Result};
use serde_json::Value;

/// Editing form of a source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    /// Pretty-printed JSON document
    Record(String),
    /// The line was blank; the placeholder is offered instead
    Blank(String),
}

impl Formatted {
    pub fn text(&self) -> &str {
        match self {
            Formatted::Record(text) | Formatted::Blank(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Formatted::Record(text) | Formatted::Blank(text) => text,
        }
    }
}

/// Pretty-print a source line for editing
///
/// Keys keep their source order and nesting is indented by two spaces.
/// Blank lines yield `placeholder`.
pub fn format_line(line: usize, content: &str, placeholder: &str) -> Result<Formatted> {
    if content.trim().is_empty() {
        return Ok(Formatted::Blank(placeholder.to_string()));
    }

    let value: Value =
        serde_json::from_str(content).map_err(|e| RecordError::invalid_record(line, &e))?;
    let pretty = serde_json::to_string_pretty(&value).map_err(|e| RecordError::invalid_record(line, &e))?;
    Ok(Formatted::Record(pretty))
}

/// Validate edited text and collapse it to a single compact line
pub fn compact(line: usize, edited: &str) -> Result<String> {
    let value: Value =
        serde_json::from_str(edited).map_err(|e| RecordError::invalid_record(line, &e))?;
    serde_json::to_string(&value).map_err(|e| RecordError::invalid_record(line, &e))
}
