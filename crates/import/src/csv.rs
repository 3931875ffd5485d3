use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::table::RawTable;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvReadOptions {
    pub delimiter: String,
    /// Accept records whose length differs from the header.
    pub flexible: bool,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            flexible: true,
        }
    }
}

impl CsvReadOptions {
    /// The delimiter must be a single ASCII character.
    fn delimiter_byte(&self) -> Result<u8, CsvError> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(CsvError::InvalidDelimiter(self.delimiter.clone())),
        }
    }
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Input has no header row")]
    EmptyInput,
    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(String),
}

/// Reads a header row and every following record into a `RawTable`.
///
/// Cells are kept verbatim and every record becomes a row, blank ones
/// included, so row positions match data record positions. Coercion is left
/// to the validator.
pub fn read_table<R: Read>(data: R, options: &CsvReadOptions) -> Result<RawTable, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(options.flexible)
        .delimiter(options.delimiter_byte()?)
        .from_reader(data);

    let mut records = reader.records();
    let header = match records.next() {
        Some(result) => result?,
        None => return Err(CsvError::EmptyInput),
    };

    let columns: Vec<String> = header
        .iter()
        .map(|s| s.trim_start_matches('\u{feff}').to_string())
        .collect();
    let width = columns.len();
    let mut table = RawTable::new(columns);

    for result in records {
        let record = result?;
        let row = (0..width)
            .map(|idx| record.get(idx).map(|s| s.to_string()))
            .collect();
        table.push_row(row);
    }

    tracing::debug!("Read {} rows with {} columns", table.len(), width);
    Ok(table)
}

pub fn read_table_from_path(path: &Path, options: &CsvReadOptions) -> Result<RawTable, CsvError> {
    let file = File::open(path)?;
    read_table(file, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_rows() {
        let data = b"Data,Descricao,Valor\n2024-01-15,Mercado,-49.99\n2024-01-16,Salario,3000\n";
        let table = read_table(data.as_ref(), &CsvReadOptions::default()).unwrap();
        assert_eq!(table.columns, ["Data", "Descricao", "Valor"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 2), Some("-49.99"));
    }

    #[test]
    fn short_records_get_absent_cells() {
        let data = b"date,description,amount\n2024-01-15,Rent\n";
        let table = read_table(data.as_ref(), &CsvReadOptions::default()).unwrap();
        assert_eq!(table.rows[0], vec![Some("2024-01-15".to_string()), Some("Rent".to_string()), None]);
    }

    #[test]
    fn blank_cells_stay_present() {
        let data = b"date,description,amount\n2024-01-15,,10\n";
        let table = read_table(data.as_ref(), &CsvReadOptions::default()).unwrap();
        assert_eq!(table.cell(0, 1), Some(""));
    }

    #[test]
    fn blank_records_keep_their_position() {
        let data = b"date,description,amount\n2024-01-01,A,1\n,,\nnot-a-date,Rent,1000\n";
        let table = read_table(data.as_ref(), &CsvReadOptions::default()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(1, 0), Some(""));
        assert_eq!(table.cell(2, 1), Some("Rent"));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        for delimiter in ["§", "", ";;"] {
            let options = CsvReadOptions {
                delimiter: delimiter.to_string(),
                ..CsvReadOptions::default()
            };
            let result = read_table(b"a\xc2\xa7b\n".as_ref(), &options);
            assert!(
                matches!(&result, Err(CsvError::InvalidDelimiter(d)) if d == delimiter),
                "delimiter {delimiter:?} was accepted"
            );
        }
    }

    #[test]
    fn semicolon_delimiter() {
        let data = "data;descrição;valor\n15/01/2024;Padaria;12.5\n".as_bytes();
        let options = CsvReadOptions {
            delimiter: ";".to_string(),
            ..CsvReadOptions::default()
        };
        let table = read_table(data, &options).unwrap();
        assert_eq!(table.columns[1], "descrição");
        assert_eq!(table.cell(0, 0), Some("15/01/2024"));
    }

    #[test]
    fn byte_order_mark_is_dropped_from_first_label() {
        let data = "\u{feff}date,description,amount\n".as_bytes();
        let table = read_table(data, &CsvReadOptions::default()).unwrap();
        assert_eq!(table.columns[0], "date");
        assert!(table.is_empty());
    }

    #[test]
    fn empty_input_errors() {
        let result = read_table(b"".as_ref(), &CsvReadOptions::default());
        assert!(matches!(result, Err(CsvError::EmptyInput)));
    }
}
