//! Canonical forms for the dates and numbers sources hand back.
//!
//! Both transformations are non-destructive: input that cannot be understood
//! is returned as given, and running either function on its own output is a
//! no-op.

use std::str::FromStr;

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

use crate::exchange_rate::RateValue;

/// Canonical date format, `YYYY-MM-DD`.
pub const CANONICAL_DATE: &str = "%Y-%m-%d";

// chrono accepts unpadded day/month fields, so `%d/%m/%Y` also covers `25/4/2025`.
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", CANONICAL_DATE];

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
}

/// Converts `DD/MM/YYYY`, `D/M/YYYY` or `YYYY-MM-DD` to `YYYY-MM-DD`.
pub fn normalize_date(input: &str) -> String {
    if input.trim().is_empty() {
        return input.to_string();
    }
    match parse_date(input) {
        Some(date) => date.format(CANONICAL_DATE).to_string(),
        None => {
            warn!("Unrecognized quote date {input:?}, keeping it as is");
            input.to_string()
        }
    }
}

/// How a source writes its numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notation {
    /// Decide from the separators present.
    #[default]
    Inferred,
    /// Argentine notation: `.` only groups thousands and `,` marks decimals,
    /// so `$1.180` is eleven hundred eighty pesos.
    DecimalComma,
}

/// Parses rates such as `$ 1.234,56`, `1234,56` or `1234.56`.
///
/// When a decimal comma is present every dot is a thousands separator. With
/// no comma, several dots are thousands separators and a single dot is the
/// decimal point. Exponent forms such as `1e3` are rejected.
pub fn parse_number(input: &str) -> Option<Decimal> {
    parse_number_as(input, Notation::Inferred)
}

pub fn parse_number_as(input: &str, notation: Notation) -> Option<Decimal> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$')
        .collect();
    let cleaned = cleaned.trim_start_matches(|c: char| c.is_alphabetic());
    if cleaned.is_empty() {
        return None;
    }

    let canonical = if notation == Notation::DecimalComma || cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        cleaned.to_string()
    };

    if !canonical
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return None;
    }
    Decimal::from_str(&canonical).ok()
}

pub fn normalize_number(input: &str) -> RateValue {
    normalize_number_as(input, Notation::Inferred)
}

/// [`normalize_number`] for text published in a known notation.
pub fn normalize_number_as(input: &str, notation: Notation) -> RateValue {
    match parse_number_as(input, notation) {
        Some(value) => RateValue::Number(value),
        None => RateValue::Raw(input.to_string()),
    }
}
