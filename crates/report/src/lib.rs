pub mod aggregate;
pub mod export;

pub use aggregate::{
    add_period, summarize_by_category, summarize_by_period, total_amount, Categorized,
    PeriodSummaryRow, PeriodTransaction, SummaryRow,
};
pub use export::{export_reports, ExportError, ExportSummary, Reports};
