//! Price input handling
//!
//! Visitors type free text into the price fields. Everything except ASCII
//! digits is discarded before the value is stored, formatted or parsed.

use serde::{Deserialize, Serialize};

use crate::catalog::{Amount, MAX_AMOUNT};

/// Digit grouping rules for displayed amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberLocale {
    /// Costa Rican Spanish: groups separated by a no-break space
    #[serde(rename = "es-CR")]
    EsCr,
    /// US English: groups separated by a comma
    #[serde(rename = "en-US")]
    EnUs,
}

impl NumberLocale {
    pub fn group_separator(self) -> char {
        match self {
            NumberLocale::EsCr => '\u{a0}',
            NumberLocale::EnUs => ',',
        }
    }

    /// Parse a BCP 47 tag, case-insensitively
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "es-cr" | "es_cr" => Some(NumberLocale::EsCr),
            "en-us" | "en_us" => Some(NumberLocale::EnUs),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            NumberLocale::EsCr => "es-CR",
            NumberLocale::EnUs => "en-US",
        }
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        NumberLocale::EsCr
    }
}

/// Keep only the ASCII digits of `raw`
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Render user input for display.
///
/// Non-digits are stripped, leading zeros dropped and the remaining digits
/// grouped in threes. Input without digits renders as an empty string.
/// Works on the digit string directly, so arbitrarily long input never
/// overflows.
pub fn format_for_display(raw: &str, locale: NumberLocale) -> String {
    let digits = strip_non_digits(raw);
    if digits.is_empty() {
        return String::new();
    }

    let significant = digits.trim_start_matches('0');
    let significant = if significant.is_empty() { "0" } else { significant };

    group_digits(significant, locale.group_separator())
}

/// Format a known amount, e.g. a catalog base price
pub fn format_amount(amount: Amount, locale: NumberLocale) -> String {
    group_digits(&amount.to_string(), locale.group_separator())
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len_utf8());

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }

    out
}

/// Parse a cleaned digit string into an amount.
///
/// Returns `None` for empty input, anything that is not all digits, or a
/// value above `MAX_AMOUNT`.
pub fn parse_amount(digits: &str) -> Option<Amount> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let significant = digits.trim_start_matches('0');
    // u64 holds every 19-digit value
    if significant.len() > 19 {
        return None;
    }

    let value = if significant.is_empty() {
        0
    } else {
        significant.parse::<Amount>().ok()?
    };

    (value <= MAX_AMOUNT).then_some(value)
}
