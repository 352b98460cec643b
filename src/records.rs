//! Segment file storage.
//!
//! Records are stored as a YAML block sequence with keys in a fixed
//! order (`id`, `title`, `content`). Multi-line values are written as
//! literal blocks so chapter text stays readable and diffable. Reading
//! goes through `serde_yaml`.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use tempfile::NamedTempFile;

/// Indentation of keys inside a sequence item.
const ITEM_INDENT: usize = 2;

/// One persisted segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier such as `Chapter_3_Segment_41`.
    pub id: String,
    /// Header line of the chapter the segment came from.
    pub title: String,
    /// Segment text, possibly multi-line.
    pub content: String,
}

/// How a scalar value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarStyle {
    Plain,
    DoubleQuoted,
    Literal,
}

fn needs_escape(c: char) -> bool {
    (c.is_control() && c != '\n') || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}')
}

fn scalar_style(value: &str) -> ScalarStyle {
    if value.chars().any(needs_escape) {
        return ScalarStyle::DoubleQuoted;
    }

    if value.contains('\n') {
        // A block made only of line breaks has nothing to anchor its indentation.
        if value.trim_matches('\n').is_empty() {
            return ScalarStyle::DoubleQuoted;
        }
        return ScalarStyle::Literal;
    }

    if value.contains(['\\', '"', '\'']) {
        ScalarStyle::DoubleQuoted
    } else {
        ScalarStyle::Plain
    }
}

/// Writes `value` as a YAML double-quoted scalar.
fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_escape(c) => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Writes `value` as a literal block scalar indented by `indent` spaces.
///
/// Chomping is chosen so that trailing line breaks survive a round trip.
fn literal_block(value: &str, indent: usize) -> String {
    let body = value.trim_end_matches('\n');
    let trailing = value.len() - body.len();

    let chomping = match trailing {
        0 => "-",
        1 => "",
        _ => "+",
    };

    let first_line_indented = body
        .split('\n')
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with(' '));
    let indicator = if first_line_indented {
        ITEM_INDENT.to_string()
    } else {
        String::new()
    };

    let pad = " ".repeat(indent);
    let mut out = format!("|{}{}\n", indicator, chomping);
    for line in body.split('\n') {
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
        out.push('\n');
    }
    for _ in 1..trailing {
        out.push('\n');
    }
    out
}

/// Renders one scalar, including the separating space and final newline.
fn render_scalar(value: &str, indent: usize) -> Result<String, RecordError> {
    Ok(match scalar_style(value) {
        ScalarStyle::Literal => format!(" {}", literal_block(value, indent)),
        ScalarStyle::DoubleQuoted => format!(" {}\n", double_quoted(value)),
        ScalarStyle::Plain => {
            let encoded = serde_yaml::to_string(value)?;
            let encoded = encoded.trim_end_matches('\n');
            if encoded.contains('\n') {
                // Wrapped by the emitter; keep each value on one line.
                format!(" {}\n", double_quoted(value))
            } else {
                format!(" {}\n", encoded)
            }
        }
    })
}

fn push_field(out: &mut String, lead: &str, key: &str, value: &str) -> Result<(), RecordError> {
    out.push_str(lead);
    out.push_str(key);
    out.push(':');
    out.push_str(&render_scalar(value, ITEM_INDENT * 2)?);
    Ok(())
}

/// Serializes records to YAML text.
///
/// `serde_yaml::to_string` picks its own scalar styles and cannot be told
/// to double-quote single-line values holding `\`, `"` or `'`, nor to
/// always use literal blocks for multi-line text, so records are written
/// field by field here. Plain scalars still go through `serde_yaml`.
pub fn to_yaml(records: &[Record]) -> Result<String, RecordError> {
    if records.is_empty() {
        return Ok("[]\n".to_string());
    }

    let mut out = String::new();
    for record in records {
        push_field(&mut out, "- ", "id", &record.id)?;
        push_field(&mut out, "  ", "title", &record.title)?;
        push_field(&mut out, "  ", "content", &record.content)?;
    }
    Ok(out)
}

/// Parses records from YAML text. An empty document holds no records.
pub fn from_yaml(text: &str) -> Result<Vec<Record>, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(text)
}

/// Loads records from a segment file.
pub fn load(path: &Path) -> Result<Vec<Record>, RecordError> {
    let text = std::fs::read_to_string(path).map_err(|source| RecordError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    from_yaml(&text).map_err(|source| RecordError::DecodeError {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes records to a segment file, replacing it atomically.
///
/// The data goes to a temporary file next to `path` which is then renamed
/// over it, so an interrupted run leaves either the old or the new file.
pub fn save(path: &Path, records: &[Record]) -> Result<(), RecordError> {
    let yaml = to_yaml(records)?;
    let write_error = |message: String| RecordError::WriteError {
        path: path.to_path_buf(),
        message,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
    file.write_all(yaml.as_bytes())
        .map_err(|e| write_error(e.to_string()))?;
    file.as_file()
        .sync_all()
        .map_err(|e| write_error(e.to_string()))?;
    file.persist(path)
        .map_err(|e| write_error(e.error.to_string()))?;

    Ok(())
}
