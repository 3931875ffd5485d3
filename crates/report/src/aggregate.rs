use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tally_core::{CategorizedTransaction, Granularity, Money, PeriodKey};

/// Anything that carries a categorized transaction.
pub trait Categorized {
    fn categorized(&self) -> &CategorizedTransaction;

    fn date(&self) -> NaiveDate {
        self.categorized().transaction.date
    }

    fn amount(&self) -> Money {
        self.categorized().transaction.amount
    }
}

impl Categorized for CategorizedTransaction {
    fn categorized(&self) -> &CategorizedTransaction {
        self
    }
}

/// A categorized transaction with its period columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTransaction {
    pub row: CategorizedTransaction,
    pub year: i32,
    pub month: u32,
    pub period: PeriodKey,
}

impl Categorized for PeriodTransaction {
    fn categorized(&self) -> &CategorizedTransaction {
        &self.row
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummaryRow {
    pub period: PeriodKey,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub total: Money,
}

/// Group label ordering: present labels lexicographically, missing last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Label<'a>(Option<&'a str>);

impl Ord for Label<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Label<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn labels(row: &CategorizedTransaction) -> (Label<'_>, Label<'_>) {
    (
        Label(row.category.as_deref()),
        Label(row.subcategory.as_deref()),
    )
}

fn owned(label: Label<'_>) -> Option<String> {
    label.0.map(str::to_string)
}

/// Derives year, month and period key from each row's date.
///
/// Applying it to rows that already carry period columns recomputes them from
/// the date, so repeated application with one granularity is stable.
pub fn add_period<R: Categorized>(rows: &[R], granularity: Granularity) -> Vec<PeriodTransaction> {
    rows.iter()
        .map(|r| {
            let date = r.date();
            PeriodTransaction {
                row: r.categorized().clone(),
                year: date.year(),
                month: date.month(),
                period: PeriodKey::containing(date, granularity),
            }
        })
        .collect()
}

/// Totals per (category, subcategory), sorted by label.
///
/// Inputs are never modified. Missing labels form their own group, which sorts
/// after every present label.
pub fn summarize_by_category<R: Categorized>(rows: &[R]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(Label<'_>, Label<'_>), Money> = BTreeMap::new();
    for r in rows {
        *groups.entry(labels(r.categorized())).or_default() += r.amount();
    }

    groups
        .into_iter()
        .map(|((category, subcategory), total)| SummaryRow {
            category: owned(category),
            subcategory: owned(subcategory),
            total,
        })
        .collect()
}

/// Totals per (period, category, subcategory), sorted chronologically and then
/// by label.
pub fn summarize_by_period<R: Categorized>(rows: &[R], granularity: Granularity) -> Vec<PeriodSummaryRow> {
    let mut groups: BTreeMap<(PeriodKey, Label<'_>, Label<'_>), Money> = BTreeMap::new();
    for r in rows {
        let period = PeriodKey::containing(r.date(), granularity);
        let (category, subcategory) = labels(r.categorized());
        *groups.entry((period, category, subcategory)).or_default() += r.amount();
    }

    groups
        .into_iter()
        .map(|((period, category, subcategory), total)| PeriodSummaryRow {
            period,
            category: owned(category),
            subcategory: owned(subcategory),
            total,
        })
        .collect()
}

pub fn total_amount<R: Categorized>(rows: &[R]) -> Money {
    rows.iter().map(Categorized::amount).sum()
}
