//! Chapter header detection.
//!
//! A line is tested against a small, ordered set of header patterns.
//! The first pattern that both matches and yields a number wins.

use super::numerals::{parse_chinese_numeral, parse_decimal_digits};
use regex::Regex;
use std::sync::LazyLock;

/// `第<Chinese numeral>章`
static LOCALIZED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^第([〇零一二两三四五六七八九十百千]+)章").expect("Invalid LOCALIZED_REGEX")
});

/// `第<1-3 digits>章`, digits from any script.
static ARABIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^第(\d{1,3})章").expect("Invalid ARABIC_REGEX"));

/// 1-3 leading digits followed by a non-digit.
static LOOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})\D").expect("Invalid LOOSE_REGEX"));

/// The kind of header a line was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPattern {
    /// Chinese numeral chapter marker, e.g. `第十二章`.
    Localized,
    /// Arabic numeral chapter marker, e.g. `第12章`.
    Arabic,
    /// Any line starting with a short number, e.g. `12 The Return`.
    ///
    /// Low confidence: ordinary sentences that begin with a number
    /// are picked up too.
    Loose,
}

/// Patterns in priority order.
pub const HEADER_PATTERNS: [HeaderPattern; 3] = [
    HeaderPattern::Localized,
    HeaderPattern::Arabic,
    HeaderPattern::Loose,
];

impl HeaderPattern {
    fn regex(self) -> &'static Regex {
        match self {
            HeaderPattern::Localized => &LOCALIZED_REGEX,
            HeaderPattern::Arabic => &ARABIC_REGEX,
            HeaderPattern::Loose => &LOOSE_REGEX,
        }
    }

    /// Extracts the candidate chapter number from a line.
    ///
    /// Returns `None` if the line does not match or the numeral
    /// cannot be converted.
    pub fn extract(self, line: &str) -> Option<u32> {
        let captures = self.regex().captures(line)?;
        let numeral = captures.get(1)?.as_str();

        match self {
            HeaderPattern::Localized => parse_chinese_numeral(numeral),
            HeaderPattern::Arabic | HeaderPattern::Loose => parse_decimal_digits(numeral),
        }
    }
}

/// A recognized header candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch {
    pub pattern: HeaderPattern,
    pub number: u32,
}

/// Tries each header pattern in priority order.
///
/// The range check is left to the caller.
pub fn detect_header(line: &str) -> Option<HeaderMatch> {
    HEADER_PATTERNS.iter().find_map(|&pattern| {
        pattern
            .extract(line)
            .map(|number| HeaderMatch { pattern, number })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localized_header() {
        let found = detect_header("第十二章 归来").unwrap();
        assert_eq!(found.pattern, HeaderPattern::Localized);
        assert_eq!(found.number, 12);
    }

    #[test]
    fn test_arabic_header() {
        let found = detect_header("第12章 归来").unwrap();
        assert_eq!(found.pattern, HeaderPattern::Arabic);
        assert_eq!(found.number, 12);
    }

    #[test]
    fn test_full_width_digits() {
        let found = detect_header("第１２章 归来").unwrap();
        assert_eq!(found.pattern, HeaderPattern::Arabic);
        assert_eq!(found.number, 12);

        let found = detect_header("３　归来").unwrap();
        assert_eq!(found.pattern, HeaderPattern::Loose);
        assert_eq!(found.number, 3);

        assert_eq!(detect_header("１２３４年"), None);
    }

    #[test]
    fn test_arabic_header_too_many_digits() {
        // Four digits is not an Arabic header, and the line starts with 第
        // so the loose pattern cannot match either.
        assert_eq!(detect_header("第1234章"), None);
    }

    #[test]
    fn test_loose_header() {
        let found = detect_header("5 people arrived").unwrap();
        assert_eq!(found.pattern, HeaderPattern::Loose);
        assert_eq!(found.number, 5);

        let found = detect_header("007号").unwrap();
        assert_eq!(found.number, 7);
    }

    #[test]
    fn test_loose_requires_trailing_non_digit() {
        assert_eq!(detect_header("12"), None);
        assert_eq!(detect_header("1234 years later"), None);
    }

    #[test]
    fn test_malformed_numeral_is_not_a_header() {
        assert_eq!(detect_header("第十十章"), None);
        assert_eq!(HeaderPattern::Localized.extract("第一二章"), None);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_header("他走进了房间。"), None);
        assert_eq!(detect_header("Chapter one"), None);
    }
}
