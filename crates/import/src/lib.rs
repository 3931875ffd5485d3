pub mod csv;
pub mod rule_file;
pub mod rules;
pub mod schema;
pub mod table;
pub mod validate;

pub use crate::csv::{read_table, read_table_from_path, CsvError, CsvReadOptions};
pub use rule_file::{ensure_subcategories, KeywordRuleSpec, RuleFile, RuleFileError, RuleTarget};
pub use rules::{CategoryManager, CategoryRule, Resolution, RuleKind};
pub use schema::{default_aliases, extend_aliases, standardize, AliasTable, Field, SchemaError};
pub use table::RawTable;
pub use validate::{
    parse_amount, parse_date, validate, validate_table, InvalidReason, InvalidRow, RawTransaction,
    ValidationResult, MAX_AMOUNT,
};

/// Sorted, de-duplicated descriptions, for drafting manual rules.
pub fn list_unique_descriptions(rows: &[tally_core::Transaction]) -> Vec<String> {
    let unique: std::collections::BTreeSet<&str> =
        rows.iter().map(|tx| tx.description.trim()).collect();
    unique.into_iter().map(str::to_string).collect()
}
