use std::path::{Path, PathBuf};
use tally_import::InvalidRow;
use thiserror::Error;

use crate::aggregate::{Categorized, PeriodSummaryRow, PeriodTransaction, SummaryRow};

pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const BY_PERIOD_FILE: &str = "by_period.csv";
pub const INVALID_FILE: &str = "invalid.csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Every table produced by one run.
#[derive(Debug, Clone, Default)]
pub struct Reports {
    pub transactions: Vec<PeriodTransaction>,
    pub summary: Vec<SummaryRow>,
    pub by_period: Vec<PeriodSummaryRow>,
    pub invalid: Vec<InvalidRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
}

/// Writes one CSV file per table into `dir`, creating it if needed.
///
/// `invalid.csv` is only written when there are invalid rows.
pub fn export_reports(dir: &Path, reports: &Reports) -> Result<ExportSummary, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut summary = ExportSummary::default();

    let path = dir.join(TRANSACTIONS_FILE);
    write_table(
        &path,
        &["date", "description", "amount", "category", "subcategory", "year", "month", "period"],
        reports.transactions.iter().map(|t| {
            let row = t.categorized();
            vec![
                row.transaction.date.to_string(),
                row.transaction.description.clone(),
                row.transaction.amount.to_string(),
                label(&row.category),
                label(&row.subcategory),
                t.year.to_string(),
                t.month.to_string(),
                t.period.to_string(),
            ]
        }),
    )?;
    summary.files.push(path);

    let path = dir.join(SUMMARY_FILE);
    write_table(
        &path,
        &["category", "subcategory", "total"],
        reports.summary.iter().map(|s| {
            vec![label(&s.category), label(&s.subcategory), s.total.to_string()]
        }),
    )?;
    summary.files.push(path);

    let path = dir.join(BY_PERIOD_FILE);
    write_table(
        &path,
        &["period", "category", "subcategory", "total"],
        reports.by_period.iter().map(|s| {
            vec![
                s.period.to_string(),
                label(&s.category),
                label(&s.subcategory),
                s.total.to_string(),
            ]
        }),
    )?;
    summary.files.push(path);

    if !reports.invalid.is_empty() {
        let path = dir.join(INVALID_FILE);
        write_table(
            &path,
            &["index", "date", "description", "amount", "reasons"],
            reports.invalid.iter().map(|r| {
                let reasons: Vec<String> = r.reasons.iter().map(|x| x.to_string()).collect();
                vec![
                    r.index.to_string(),
                    label(&r.raw.date),
                    label(&r.raw.description),
                    label(&r.raw.amount),
                    reasons.join("; "),
                ]
            }),
        )?;
        summary.files.push(path);
    }

    tracing::info!("Exported {} files to {}", summary.files.len(), dir.display());
    Ok(summary)
}

fn label(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn write_table<I>(path: &Path, header: &[&str], rows: I) -> Result<(), ExportError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
