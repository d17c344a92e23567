//! Quote records: one bank's USD/ARS buy and sell observation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Format of the `collected_at` column.
pub const COLLECTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Banks a quote can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
    Bna,
    Provincia,
    Ciudad,
    Bbva,
}

impl Bank {
    pub const ALL: [Bank; 4] = [Bank::Bna, Bank::Provincia, Bank::Bbva, Bank::Ciudad];

    /// Name written to the `source` column.
    pub fn name(&self) -> &'static str {
        match self {
            Bank::Bna => "BNA",
            Bank::Provincia => "Banco Provincia",
            Bank::Ciudad => "Banco Ciudad",
            Bank::Bbva => "BBVA",
        }
    }

    /// Word users type to ask for this bank.
    pub fn keyword(&self) -> &'static str {
        match self {
            Bank::Bna => "BNA",
            Bank::Provincia => "PROVINCIA",
            Bank::Ciudad => "CIUDAD",
            Bank::Bbva => "BBVA",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Bank> {
        Bank::ALL
            .into_iter()
            .find(|bank| bank.keyword().eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Bank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Bank::ALL
            .into_iter()
            .find(|bank| bank.name().eq_ignore_ascii_case(s))
            .or_else(|| Bank::from_keyword(s))
            .ok_or_else(|| format!("unknown source: {s:?}"))
    }
}

/// Outcome of one collection attempt, as stored in the `status` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    Error(String),
    CriticalError(String),
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("Success"),
            Status::Error(reason) => write!(f, "Error: {reason}"),
            Status::CriticalError(reason) => write!(f, "Critical Error: {reason}"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "Success" {
            Ok(Status::Success)
        } else if let Some(reason) = s.strip_prefix("Critical Error:") {
            Ok(Status::CriticalError(reason.trim_start().to_string()))
        } else if let Some(reason) = s.strip_prefix("Error:") {
            Ok(Status::Error(reason.trim_start().to_string()))
        } else {
            Err(format!("unknown status: {s:?}"))
        }
    }
}

/// A rate as stored: parsed when possible, otherwise the text the source gave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateValue {
    Number(Decimal),
    Raw(String),
}

impl RateValue {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            RateValue::Number(value) => Some(*value),
            RateValue::Raw(_) => None,
        }
    }
}

impl fmt::Display for RateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateValue::Number(value) => write!(f, "{value}"),
            RateValue::Raw(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rates {
    pub buy: RateValue,
    pub sell: RateValue,
}

/// One observation of a bank's rates.
///
/// Rates are present exactly when the status is `Success`; the two
/// constructors are the only way to build a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRecord {
    collected_at: NaiveDateTime,
    quote_date: String,
    rates: Option<Rates>,
    source: Bank,
    status: Status,
}

impl QuoteRecord {
    pub fn success(
        source: Bank,
        collected_at: NaiveDateTime,
        quote_date: impl Into<String>,
        rates: Rates,
    ) -> Self {
        Self {
            collected_at,
            quote_date: quote_date.into(),
            rates: Some(rates),
            source,
            status: Status::Success,
        }
    }

    /// A failed attempt. A `Success` status is downgraded to an error since
    /// a successful record must carry rates.
    pub fn failure(source: Bank, collected_at: NaiveDateTime, status: Status) -> Self {
        let status = match status {
            Status::Success => Status::Error("no rates collected".to_string()),
            other => other,
        };
        Self {
            collected_at,
            quote_date: String::new(),
            rates: None,
            source,
            status,
        }
    }

    pub fn collected_at(&self) -> NaiveDateTime {
        self.collected_at
    }

    pub fn quote_date(&self) -> &str {
        &self.quote_date
    }

    pub fn rates(&self) -> Option<&Rates> {
        self.rates.as_ref()
    }

    pub fn source(&self) -> Bank {
        self.source
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
