use tally_core::{Granularity, Money, UNCATEGORIZED};
use tally_import::{default_aliases, read_table, validate_table, CsvReadOptions, RuleFile, SchemaError};
use tally_report::{
    add_period, export_reports, summarize_by_category, summarize_by_period, total_amount, Reports,
};

const STATEMENT: &str = "\
Data;Descrição;Valor;Saldo
2024-01-15;Uber Eats;-45.90;100
2024-01-20;UBER *TRIP;-18.00;82
2024-01-22;internet bill;-99.90;0
not-a-date;Rent;1000;0
2024-02-01;Salário;5000;5000
2024-02-03;  ;12;0
2024-02-05;Padaria São João;abc;0
2024-02-10;Cinema;-30;4970
";

const RULES: &str = r#"{
    "manual": {
        "uber eats": {"categoria": "Food", "subcategoria": "Delivery"},
        "Salario": {"category": "Income", "subcategory": "Salary"}
    },
    "keywords": [
        {"category": "Transport", "subcategory": "Rides", "keywords": ["uber"]},
        {"category": "A", "subcategory": "A1", "keywords": ["net"]},
        {"category": "B", "subcategory": "B1", "keywords": ["internet"]}
    ]
}"#;

fn options() -> CsvReadOptions {
    CsvReadOptions {
        delimiter: ";".to_string(),
        ..CsvReadOptions::default()
    }
}

#[test]
fn statement_to_reports() {
    let table = read_table(STATEMENT.as_bytes(), &options()).unwrap();
    let validation = validate_table(&table, &default_aliases()).unwrap();

    assert_eq!(validation.total(), table.len());
    assert_eq!(validation.valid.len(), 5);
    let invalid: Vec<usize> = validation.invalid.iter().map(|r| r.index).collect();
    assert_eq!(invalid, [3, 5, 6]);

    let manager = RuleFile::from_json_str(RULES).unwrap().into_manager();
    let categorized = manager.categorize_table(&validation.valid);
    let labels: Vec<(&str, &str)> = categorized
        .iter()
        .map(|r| (r.category.as_deref().unwrap(), r.subcategory.as_deref().unwrap()))
        .collect();
    assert_eq!(
        labels,
        [
            ("Food", "Delivery"),
            ("Transport", "Rides"),
            ("A", "A1"),
            ("Income", "Salary"),
            (UNCATEGORIZED, UNCATEGORIZED),
        ]
    );

    let enriched = add_period(&categorized, Granularity::Monthly);
    let summary = summarize_by_category(&enriched);
    let by_period = summarize_by_period(&enriched, Granularity::Monthly);

    let grouped: Money = summary.iter().map(|s| s.total).sum();
    assert_eq!(grouped, total_amount(&categorized));
    let period_total: Money = by_period.iter().map(|s| s.total).sum();
    assert_eq!(period_total, grouped);

    // The rent row had a bad date and must not reach any summary.
    assert!(summary.iter().all(|s| s.total != Money::from_cents(100_000)));
    assert!(by_period.iter().all(|s| s.period.to_string() != "not-a-date"));
    assert_eq!(by_period.first().map(|s| s.period.to_string()).as_deref(), Some("2024-01"));

    let dir = tempfile::tempdir().unwrap();
    let exported = export_reports(
        dir.path(),
        &Reports {
            transactions: enriched,
            summary,
            by_period,
            invalid: validation.invalid,
        },
    )
    .unwrap();
    assert_eq!(exported.files.len(), 4);

    let invalid_csv = std::fs::read_to_string(dir.path().join("invalid.csv")).unwrap();
    assert!(invalid_csv.contains("3,not-a-date,Rent,1000,invalid date"));
    assert!(invalid_csv.contains("6,2024-02-05,Padaria São João,abc,invalid amount"));
}

#[test]
fn missing_column_stops_before_validation() {
    let table = read_table("date,memo,value\n2024-01-01,x,1\n".as_bytes(), &CsvReadOptions::default()).unwrap();
    let err = validate_table(&table, &default_aliases()).unwrap_err();
    assert_eq!(err, SchemaError::MissingColumns(vec!["description".to_string()]));
}

#[test]
fn blank_record_keeps_later_indices_aligned() {
    let data = "date,description,amount\n2024-01-01,A,1\n,,\nnot-a-date,Rent,1000\n";
    let table = read_table(data.as_bytes(), &CsvReadOptions::default()).unwrap();
    let validation = validate_table(&table, &default_aliases()).unwrap();

    assert_eq!(validation.total(), 3);
    let invalid: Vec<usize> = validation.invalid.iter().map(|r| r.index).collect();
    assert_eq!(invalid, [1, 2]);
    assert_eq!(validation.invalid[1].raw.description.as_deref(), Some("Rent"));
}

#[test]
fn oversized_amount_is_rejected_before_aggregation() {
    let data = "date,description,amount\n\
                2024-01-01,Big,79228162514264337593543950335\n\
                2024-01-02,Big,1\n";
    let table = read_table(data.as_bytes(), &CsvReadOptions::default()).unwrap();
    let validation = validate_table(&table, &default_aliases()).unwrap();
    assert_eq!(validation.invalid.len(), 1);

    let categorized = tally_import::CategoryManager::new().categorize_table(&validation.valid);
    let summary = summarize_by_category(&categorized);
    let by_period = summarize_by_period(&categorized, Granularity::Monthly);
    assert_eq!(summary[0].total, Money::from_cents(100));
    assert_eq!(by_period[0].total, Money::from_cents(100));
}
