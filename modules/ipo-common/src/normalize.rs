use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

const PLACEHOLDERS: &[&str] = &[
    "", "n/a", "na", "n.a.", "null", "none", "nil", "unknown", "-", "--", "tbd", "tba",
    "not available", "not disclosed", "not mentioned",
];

const CORPORATE_SUFFIXES: &[&str] = &[
    "limited", "ltd", "pvt", "private", "ipo", "inc", "corp", "co", "llp", "plc",
];

const GENERIC_COMPANIES: &[&str] = &[
    "company", "the company", "unknown", "various", "multiple", "multiple companies",
    "several companies", "sme", "mainboard", "ipo", "ipos", "na", "n a", "issuer",
];

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid regex"));

static LOT_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("valid regex"));

/// Canonical key used to recognise the same company across articles.
///
/// "The Acme Solutions Pvt. Ltd." and "ACME SOLUTIONS LIMITED IPO" both
/// become "acme solutions".
pub fn normalize_company_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ");
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.first() == Some(&"the") {
        tokens.remove(0);
    }
    while let Some(last) = tokens.last() {
        if CORPORATE_SUFFIXES.contains(last) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

/// Whether a normalized name is too vague to identify an issuer.
pub fn is_generic_company(normalized: &str) -> bool {
    normalized.is_empty() || GENERIC_COMPANIES.contains(&normalized)
}

/// Trim, collapse internal whitespace, and drop placeholder values.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    let collapsed = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    if PLACEHOLDERS.contains(&collapsed.to_lowercase().as_str()) {
        None
    } else {
        Some(collapsed)
    }
}

/// Parse the date formats Indian financial news uses into a calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    let without_ordinals = ORDINAL.replace_all(trimmed, "$1");
    let candidate = without_ordinals.replace('.', "").replace(" ,", ",");
    let candidate = candidate.split_whitespace().collect::<Vec<_>>().join(" ");

    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%d-%m-%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%d %B %Y",
        "%d %b %Y",
        "%d %B, %Y",
        "%d %b, %Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%B %d %Y",
        "%b %d %Y",
        "%d-%b-%Y",
        "%d-%B-%Y",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&candidate, fmt).ok())
}

/// First number in a lot-size phrase: "1,200 shares" → 1200.
pub fn parse_lot_size(value: &str) -> Option<u32> {
    let digits = LOT_DIGITS.find(value)?.as_str().replace(',', "");
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}
