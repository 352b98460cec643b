//! Utility functions for common operations.

use crate::error::TranslationError;

/// Counts the characters of `text` that are not whitespace.
///
/// This is the unit used for segment budgets, so indentation, spaces
/// between words and full-width spaces never count.
pub fn stripped_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Returns at most `max_chars` characters from the start of `text`,
/// with an ellipsis if anything was cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Checks if an HTTP response is successful, and if not, returns a detailed error.
///
/// This helper extracts both the status code and response body for better error messages.
///
/// # Arguments
/// * `response` - The reqwest Response to check
///
/// # Returns
/// Ok(response) if successful, or Err(TranslationError) with details if not
pub async fn check_response_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, TranslationError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(TranslationError::ApiError(format!(
            "HTTP {}: {}",
            status, text
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripped_len_empty() {
        assert_eq!(stripped_len(""), 0);
        assert_eq!(stripped_len(" \t\n"), 0);
    }

    #[test]
    fn test_stripped_len_ascii() {
        assert_eq!(stripped_len("Hello world"), 10);
        assert_eq!(stripped_len("  a  b  "), 2);
    }

    #[test]
    fn test_stripped_len_counts_chars_not_bytes() {
        assert_eq!(stripped_len("这是内容"), 4);
        assert_eq!(stripped_len("这是\u{3000}内容"), 4);
    }

    #[test]
    fn test_snippet_short() {
        assert_eq!(snippet("short", 30), "short");
    }

    #[test]
    fn test_snippet_cut_on_char_boundary() {
        assert_eq!(snippet("一二三四五", 3), "一二三...");
    }
}
