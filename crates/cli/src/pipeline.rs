use anyhow::{Context, Result};
use std::path::Path;
use tally_import::{
    list_unique_descriptions, read_table_from_path, validate_table, CategoryManager, CsvReadOptions,
    RuleFile,
};
use tally_report::{
    add_period, export_reports, summarize_by_category, summarize_by_period, total_amount,
    ExportSummary, Reports,
};

use crate::config::Settings;

/// Everything one run produced, for printing.
#[derive(Debug)]
pub struct Outcome {
    pub rows_read: usize,
    pub descriptions: Vec<String>,
    pub rule_count: usize,
    pub reports: Reports,
    pub exported: ExportSummary,
}

fn load_manager(settings: &Settings) -> Result<CategoryManager> {
    let Some(path) = settings.rules.as_deref() else {
        tracing::info!("No rule file given; every row will be Uncategorized");
        return Ok(CategoryManager::new());
    };
    let manager = RuleFile::load(path)
        .with_context(|| format!("load rules from {}", path.display()))?
        .into_manager();
    tracing::info!(
        "Loaded {} manual and {} keyword rules from {}",
        manager.manual_rules().count(),
        manager.keyword_rules().count(),
        path.display()
    );
    Ok(manager)
}

/// Read, validate, categorize, aggregate and export one statement.
pub fn run(input: &Path, settings: &Settings) -> Result<Outcome> {
    let options = CsvReadOptions {
        delimiter: settings.delimiter.clone(),
        ..CsvReadOptions::default()
    };
    let table = read_table_from_path(input, &options)
        .with_context(|| format!("read {}", input.display()))?;

    let validation = validate_table(&table, &settings.aliases)
        .with_context(|| format!("in {}", input.display()))?;
    for row in &validation.invalid {
        let reasons: Vec<String> = row.reasons.iter().map(|r| r.to_string()).collect();
        tracing::warn!("Row {} rejected: {}", row.index, reasons.join(", "));
    }
    tracing::info!(
        "{} valid rows, {} invalid",
        validation.valid.len(),
        validation.invalid.len()
    );

    let descriptions = list_unique_descriptions(&validation.valid);
    let manager = load_manager(settings)?;

    let categorized = manager.categorize_table(&validation.valid);
    let transactions = add_period(&categorized, settings.period);
    let reports = Reports {
        summary: summarize_by_category(&transactions),
        by_period: summarize_by_period(&transactions, settings.period),
        transactions,
        invalid: validation.invalid,
    };

    let exported = export_reports(&settings.output, &reports)
        .with_context(|| format!("export reports to {}", settings.output.display()))?;

    Ok(Outcome {
        rows_read: table.len(),
        descriptions,
        rule_count: manager.len(),
        reports,
        exported,
    })
}

pub fn print_report(outcome: &Outcome, settings: &Settings) {
    println!("Unique descriptions ({}):", outcome.descriptions.len());
    for d in &outcome.descriptions {
        println!("  {d}");
    }

    println!();
    println!("Summary by category:");
    for row in &outcome.reports.summary {
        println!(
            "  {:<24} {:<24} {:>14}",
            row.category.as_deref().unwrap_or("-"),
            row.subcategory.as_deref().unwrap_or("-"),
            row.total.to_string()
        );
    }
    println!(
        "  {:<49} {:>14}",
        "Total",
        total_amount(&outcome.reports.transactions).to_string()
    );

    println!();
    println!(
        "{} rows read, {} categorized with {} rules, {} invalid ({} periods)",
        outcome.rows_read,
        outcome.reports.transactions.len(),
        outcome.rule_count,
        outcome.reports.invalid.len(),
        settings.period
    );
    for path in &outcome.exported.files {
        println!("Wrote {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Overrides};
    use std::fs;
    use tally_core::{Granularity, UNCATEGORIZED};

    fn settings(dir: &Path, rules: Option<&Path>) -> Settings {
        Settings::resolve(
            Config::default(),
            Overrides {
                output: Some(dir.join("out")),
                rules: rules.map(Path::to_path_buf),
                period: Some(Granularity::Monthly),
                delimiter: None,
            },
        )
    }

    #[test]
    fn runs_end_to_end_with_rules() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.csv");
        fs::write(
            &input,
            "Date,Description,Amount\n\
             2024-01-05,Mercado Livre,-120.00\n\
             2024-01-09,Salary,3000\n\
             bad,Broken,1\n",
        )
        .unwrap();
        let rules = dir.path().join("rules.toml");
        fs::write(
            &rules,
            "[[keywords]]\ncategory = \"Shopping\"\nsubcategory = \"Online\"\nkeywords = [\"mercado\"]\n",
        )
        .unwrap();

        let settings = settings(dir.path(), Some(&rules));
        let outcome = run(&input, &settings).unwrap();

        assert_eq!(outcome.rows_read, 3);
        assert_eq!(outcome.descriptions, ["Mercado Livre", "Salary"]);
        assert_eq!(outcome.rule_count, 1);
        assert_eq!(outcome.reports.invalid.len(), 1);
        assert_eq!(outcome.exported.files.len(), 4);

        let categories: Vec<&str> = outcome
            .reports
            .summary
            .iter()
            .map(|s| s.category.as_deref().unwrap())
            .collect();
        assert_eq!(categories, ["Shopping", UNCATEGORIZED]);
        assert!(dir.path().join("out/summary.csv").exists());
    }

    #[test]
    fn missing_rule_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.csv");
        fs::write(&input, "date,description,amount\n2024-01-05,x,1\n").unwrap();
        let settings = settings(dir.path(), Some(&dir.path().join("missing.json")));
        assert!(run(&input, &settings).is_err());
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.csv");
        fs::write(&input, "date,amount\n2024-01-05,1\n").unwrap();
        let err = run(&input, &settings(dir.path(), None)).unwrap_err();
        assert!(format!("{err:#}").contains("Missing required columns: description"));
    }

    #[test]
    fn non_ascii_delimiter_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.csv");
        fs::write(&input, "date§description§amount\n2024-01-05§x§1\n").unwrap();
        let mut settings = settings(dir.path(), None);
        settings.delimiter = "§".to_string();
        let err = run(&input, &settings).unwrap_err();
        assert!(format!("{err:#}").contains("single ASCII character"));
    }
}
