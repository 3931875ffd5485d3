use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// Label used for both halves of the fallback pair when no rule matches.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A validated row: date parsed, description trimmed and non-empty, amount numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Money) -> Self {
        Transaction {
            date,
            description: description.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryPair {
    pub category: String,
    pub subcategory: String,
}

impl CategoryPair {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        CategoryPair {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }

    pub fn uncategorized() -> Self {
        CategoryPair::new(UNCATEGORIZED, UNCATEGORIZED)
    }
}

impl fmt::Display for CategoryPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.category, self.subcategory)
    }
}

/// A transaction enriched with its category labels.
///
/// Labels are optional so rows categorized elsewhere (or not at all) still
/// aggregate; a missing label is its own group, distinct from `UNCATEGORIZED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    pub transaction: Transaction,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl CategorizedTransaction {
    pub fn new(transaction: Transaction, pair: CategoryPair) -> Self {
        CategorizedTransaction {
            transaction,
            category: Some(pair.category),
            subcategory: Some(pair.subcategory),
        }
    }

    pub fn unlabeled(transaction: Transaction) -> Self {
        CategorizedTransaction {
            transaction,
            category: None,
            subcategory: None,
        }
    }
}
