use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tally_core::{normalize, resolve_aliases};
use thiserror::Error;

use crate::table::RawTable;
use crate::validate::RawTransaction;

/// The three canonical fields every input table must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Date,
    Description,
    Amount,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Date, Field::Description, Field::Amount];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Description => "description",
            Field::Amount => "amount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "date" => Ok(Field::Date),
            "description" => Ok(Field::Description),
            "amount" => Ok(Field::Amount),
            other => Err(format!("Unknown field: '{other}'")),
        }
    }
}

/// Normalized column label -> canonical field.
pub type AliasTable = BTreeMap<String, Field>;

pub const DEFAULT_ALIASES: &[(&str, Field)] = &[
    ("data", Field::Date),
    ("dt", Field::Date),
    ("date", Field::Date),
    ("descricao", Field::Description),
    ("descrica", Field::Description),
    ("description", Field::Description),
    ("valor", Field::Amount),
    ("value", Field::Amount),
    ("amount", Field::Amount),
];

pub fn default_aliases() -> AliasTable {
    DEFAULT_ALIASES
        .iter()
        .map(|(label, field)| (label.to_string(), *field))
        .collect()
}

/// Adds caller-supplied aliases on top of `base`. Keys are normalized first so
/// `"Histórico"` and `"historico"` register the same alias.
pub fn extend_aliases<I, S>(base: &mut AliasTable, extra: I)
where
    I: IntoIterator<Item = (S, Field)>,
    S: AsRef<str>,
{
    for (label, field) in extra {
        base.insert(normalize(label.as_ref()), field);
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Resolves column aliases and projects every row onto the canonical fields.
///
/// Fails only when a canonical field has no column at all. When two columns
/// resolve to the same field the leftmost one is used.
pub fn standardize(table: &RawTable, aliases: &AliasTable) -> Result<Vec<RawTransaction>, SchemaError> {
    let renames = resolve_aliases(table.columns.iter().map(String::as_str), aliases);

    let mut positions: BTreeMap<Field, usize> = BTreeMap::new();
    for (idx, label) in table.columns.iter().enumerate() {
        let Some(field) = renames.get(label) else {
            continue;
        };
        if let Some(first) = positions.get(field) {
            tracing::warn!(
                "Column '{}' also maps to {}; using '{}'",
                label,
                field,
                table.columns[*first]
            );
            continue;
        }
        positions.insert(*field, idx);
    }

    let mut missing: Vec<String> = Field::ALL
        .into_iter()
        .filter(|field| !positions.contains_key(field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(SchemaError::MissingColumns(missing));
    }

    let (date, description, amount) = (
        positions[&Field::Date],
        positions[&Field::Description],
        positions[&Field::Amount],
    );
    let cell = |row: &[Option<String>], idx: usize| row.get(idx).cloned().flatten();

    Ok(table
        .rows
        .iter()
        .map(|row| RawTransaction {
            date: cell(row, date),
            description: cell(row, description),
            amount: cell(row, amount),
        })
        .collect())
}
