//! CSV lead import.
//!
//! A file goes through three steps:
//! 1. [`parse_csv`] splits it into a header row and data rows,
//! 2. [`ColumnMapping::infer`] suggests a customer field for each column,
//!    which the user may override,
//! 3. [`CsvImporter::import`] creates one customer per usable row.
//!
//! [`ImportSession`] wraps the three steps for interactive callers.

mod importer;
mod mapping;
mod parser;

pub use importer::{
    build_customer, CsvColumn, CsvImporter, CsvPreview, ImportSession, ImportSummary,
};
pub use mapping::{guess_field, ColumnMapping, CrmField};
pub use parser::{detect_delimiter, parse_csv, read_csv_file, split_line, ParsedCsv};
