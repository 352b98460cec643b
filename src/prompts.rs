//! Instruction text loaded from prompt files.

use crate::error::PromptError;
use std::path::Path;

/// Joins the non-blank lines of `text` into one line.
///
/// Each line is trimmed and the pieces are separated by single spaces.
pub fn flatten_prompt(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads a prompt file and flattens it into a single instruction.
pub fn load_prompt(path: &Path) -> Result<String, PromptError> {
    let text = std::fs::read_to_string(path).map_err(|source| PromptError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(flatten_prompt(&text))
}
