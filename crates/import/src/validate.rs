use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tally_core::{Money, Transaction};

use crate::schema::{standardize, AliasTable, SchemaError};
use crate::table::RawTable;

/// One input row projected onto the canonical fields, still untyped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
}

impl RawTransaction {
    pub fn new(date: &str, description: &str, amount: &str) -> Self {
        RawTransaction {
            date: Some(date.to_string()),
            description: Some(description.to_string()),
            amount: Some(amount.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReason {
    InvalidDate,
    MissingDescription,
    InvalidAmount,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::InvalidDate => write!(f, "invalid date"),
            InvalidReason::MissingDescription => write!(f, "missing description"),
            InvalidReason::InvalidAmount => write!(f, "invalid amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRow {
    /// Position of the row in the original input.
    pub index: usize,
    pub raw: RawTransaction,
    pub reasons: Vec<InvalidReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: Vec<Transaction>,
    pub invalid: Vec<InvalidRow>,
}

impl ValidationResult {
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}

/// Partitions rows into typed transactions and rejected rows.
///
/// Never fails: every input row ends up in exactly one of the two output
/// vectors, in input order. A missing column is caught earlier by
/// `standardize`.
pub fn validate(rows: &[RawTransaction]) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (index, raw) in rows.iter().enumerate() {
        match coerce(raw) {
            Ok(tx) => result.valid.push(tx),
            Err(reasons) => result.invalid.push(InvalidRow {
                index,
                raw: raw.clone(),
                reasons,
            }),
        }
    }

    tracing::debug!(
        "Validated {} rows: {} valid, {} invalid",
        rows.len(),
        result.valid.len(),
        result.invalid.len()
    );
    result
}

/// Resolves column aliases, then validates. The only error is a schema error.
pub fn validate_table(table: &RawTable, aliases: &AliasTable) -> Result<ValidationResult, SchemaError> {
    let rows = standardize(table, aliases)?;
    Ok(validate(&rows))
}

fn coerce(raw: &RawTransaction) -> Result<Transaction, Vec<InvalidReason>> {
    let date = raw.date.as_deref().and_then(parse_date);
    let description = raw
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let amount = raw.amount.as_deref().and_then(parse_amount);

    match (date, description, amount) {
        (Some(date), Some(description), Some(amount)) => {
            Ok(Transaction::new(date, description, Money::from_decimal(amount)))
        }
        (date, description, amount) => {
            let mut reasons = Vec::new();
            if date.is_none() {
                reasons.push(InvalidReason::InvalidDate);
            }
            if description.is_none() {
                reasons.push(InvalidReason::MissingDescription);
            }
            if amount.is_none() {
                reasons.push(InvalidReason::InvalidAmount);
            }
            Err(reasons)
        }
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses a calendar date, dropping any time of day.
///
/// Slash and dash forms are tried month-first before day-first.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(date);
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Largest accepted magnitude for a single amount (10^15).
///
/// Keeps grouped sums far inside `Decimal`'s range for any row count that fits
/// in memory.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Parses a signed decimal amount.
///
/// Accepts a leading sign, accounting parentheses for negatives, a leading
/// currency symbol and scientific notation. Thousands separators and
/// magnitudes above `MAX_AMOUNT` are rejected.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let (mut negative, s) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s),
    };

    let s = if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        rest
    } else {
        s.strip_prefix('+').unwrap_or(s)
    };

    let s = ["R$", "$", "€"]
        .iter()
        .find_map(|symbol| s.strip_prefix(symbol))
        .unwrap_or(s)
        .trim_start();

    if s.is_empty() || !s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if s.contains([',', '_', ' ']) {
        return None;
    }

    let value = Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()?;
    if value > MAX_AMOUNT {
        return None;
    }
    Some(if negative { -value } else { value })
}
