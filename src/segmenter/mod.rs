//! Chapter and segment extraction from plain-text novels.
//!
//! Raw text is split into chapters at recognized header lines, then each
//! chapter's body is packed into segments bounded by a non-whitespace
//! character budget.

mod headers;
mod numerals;

pub use headers::{HeaderMatch, HeaderPattern, detect_header};
pub use numerals::{parse_chinese_numeral, parse_decimal_digits};

use crate::config::SegmentationConfig;
use crate::records::Record;
use crate::utils::stripped_len;
use std::collections::HashSet;
use std::path::Path;

/// Default segment budget in non-whitespace characters.
pub const DEFAULT_MAX_CHARS: usize = 700;

/// Highest chapter number accepted from a header line.
pub const MAX_CHAPTER_NUMBER: u32 = 663;

/// A chapter found in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Chapter number taken from the header line.
    pub number: u32,
    /// The header line itself.
    pub title: String,
    /// Body lines after the header, blank lines removed.
    pub lines: Vec<String>,
}

/// Result of segmenting a whole document.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub chapters: Vec<Chapter>,
    pub records: Vec<Record>,
}

/// Reads a UTF-8 text file, dropping a leading byte order mark.
pub fn read_text(path: &Path) -> std::io::Result<String> {
    let text = std::fs::read_to_string(path)?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Splits `text` into chapters and segments with the default chapter bound.
pub fn extract(text: &str, max_chars: usize) -> Vec<Record> {
    let chapters = split_chapters(text, MAX_CHAPTER_NUMBER);
    pack_segments(&chapters, max_chars)
}

/// Splits `text` into chapters and segments using the given settings.
pub fn segment_document(text: &str, config: &SegmentationConfig) -> Segmentation {
    let chapters = split_chapters(text, config.max_chapter);
    let records = pack_segments(&chapters, config.max_chars);
    Segmentation { chapters, records }
}

/// Splits `text` into chapters.
///
/// Lines are trimmed and blank lines dropped. A line opens a new chapter
/// when it carries a header number in `1..=max_chapter` that has not been
/// seen before; a repeated number is kept as body text of the open
/// chapter. Lines before the first header are dropped.
pub fn split_chapters(text: &str, max_chapter: u32) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut current: Option<Chapter> = None;
    let mut seen: HashSet<u32> = HashSet::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let new_number = detect_header(line)
            .map(|found| found.number)
            .filter(|n| (1..=max_chapter).contains(n))
            .filter(|n| !seen.contains(n));

        if let Some(number) = new_number {
            seen.insert(number);
            chapters.extend(current.take());
            current = Some(Chapter {
                number,
                title: line.to_string(),
                lines: Vec::new(),
            });
        } else if let Some(chapter) = current.as_mut() {
            chapter.lines.push(line.to_string());
        }
    }

    chapters.extend(current);
    chapters
}

/// Packs chapter bodies into segment records.
///
/// The segment counter runs across the whole document. A segment is
/// closed before any line that would push its stripped length past
/// `max_chars`, then the line starts the next one. When the first body
/// line of a chapter is already over budget, the closed segment is empty
/// and still takes a counter value.
pub fn pack_segments(chapters: &[Chapter], max_chars: usize) -> Vec<Record> {
    let mut records = Vec::new();
    let mut counter: usize = 1;

    for chapter in chapters {
        let mut current: Vec<&str> = Vec::new();
        let mut current_len: usize = 0;

        for line in &chapter.lines {
            let line_len = stripped_len(line);

            if current_len + line_len > max_chars {
                records.push(make_record(chapter, counter, &current));
                counter += 1;
                current.clear();
                current_len = 0;
            }

            current.push(line);
            current_len += line_len;
        }

        if !current.is_empty() {
            records.push(make_record(chapter, counter, &current));
            counter += 1;
        }
    }

    records
}

/// Builds the identifier of a segment.
pub fn segment_id(chapter: u32, counter: usize) -> String {
    format!("Chapter_{}_Segment_{}", chapter, counter)
}

fn make_record(chapter: &Chapter, counter: usize, lines: &[&str]) -> Record {
    Record {
        id: segment_id(chapter.number, counter),
        title: chapter.title.clone(),
        content: lines.join("\n"),
    }
}
