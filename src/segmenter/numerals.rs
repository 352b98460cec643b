//! Numeral conversion for chapter headers.

use regex::Regex;
use std::sync::LazyLock;

/// A single Unicode decimal digit (general category Nd).
static DECIMAL_DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("Invalid DECIMAL_DIGIT_REGEX"));

/// Value of a Chinese digit character, excluding zero.
fn digit_value(c: char) -> Option<u32> {
    match c {
        '一' => Some(1),
        '二' | '两' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

/// Value of a Chinese place unit.
fn unit_value(c: char) -> Option<u32> {
    match c {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        _ => None,
    }
}

fn is_zero(c: char) -> bool {
    matches!(c, '零' | '〇')
}

/// Converts a Chinese numeral such as `三百六十五` to an integer.
///
/// Accepted forms:
/// - a leading `十` stands for ten (`十二` = 12)
/// - place units must strictly decrease (`十百` is malformed)
/// - `零` marks a skipped place (`一百零五` = 105)
/// - a bare digit right after `百` or `千` takes the next lower place
///   (`一百五` = 150)
///
/// Returns `None` for anything malformed, including digit runs without
/// units (`一二`) and a lone zero.
pub fn parse_chinese_numeral(text: &str) -> Option<u32> {
    let mut total: u32 = 0;
    let mut pending: Option<u32> = None;
    let mut last_unit: Option<u32> = None;
    let mut after_zero = false;

    for (i, c) in text.chars().enumerate() {
        if is_zero(c) {
            if pending.is_some() || last_unit.is_none() || after_zero {
                return None;
            }
            after_zero = true;
        } else if let Some(digit) = digit_value(c) {
            if pending.is_some() {
                return None;
            }
            pending = Some(digit);
        } else if let Some(unit) = unit_value(c) {
            if last_unit.is_some_and(|last| unit >= last) {
                return None;
            }
            let multiplier = match pending.take() {
                Some(digit) => digit,
                None if unit == 10 && (i == 0 || after_zero) => 1,
                None => return None,
            };
            total += multiplier * unit;
            last_unit = Some(unit);
            after_zero = false;
        } else {
            return None;
        }
    }

    if let Some(digit) = pending {
        total += match last_unit {
            Some(unit) if unit > 10 && !after_zero => digit * (unit / 10),
            _ => digit,
        };
    }

    (total > 0).then_some(total)
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT_REGEX.is_match(c.encode_utf8(&mut buf))
}

/// Value of a decimal digit in any script, e.g. `7`, `７` or `٧`.
///
/// Decimal digits come in contiguous runs of `0..=9`, so the value is the
/// distance from the start of the run, modulo ten.
fn decimal_digit_value(c: char) -> Option<u32> {
    if !is_decimal_digit(c) {
        return None;
    }

    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }

    Some((c as u32 - start) % 10)
}

/// Converts a run of decimal digits to an integer.
///
/// Accepts digits from any script, including full-width `１２`. Returns
/// `None` for empty input, non-digits, or overflow.
pub fn parse_decimal_digits(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }

    text.chars().try_fold(0u32, |acc, c| {
        let digit = decimal_digit_value(c)?;
        acc.checked_mul(10)?.checked_add(digit)
    })
}
