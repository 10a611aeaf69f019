//! Row normalization and sequential customer creation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::mapping::{ColumnMapping, CrmField};
use super::parser::{read_csv_file, ParsedCsv};
use crate::error::Result;
use crate::models::{Customer, CustomerStatus, NewCustomer};
use crate::store::{collections, RecordStore};

/// Number of data rows shown per column in the preview.
const PREVIEW_ROWS: usize = 5;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvColumn {
    pub index: usize,
    pub name: String,
    pub sample_values: Vec<String>,
    pub suggested: CrmField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvPreview {
    pub columns: Vec<CsvColumn>,
    pub row_count: usize,
    pub delimiter: char,
}

impl CsvPreview {
    pub fn build(parsed: &ParsedCsv, mapping: &ColumnMapping) -> Self {
        let columns = parsed
            .headers
            .iter()
            .enumerate()
            .map(|(index, name)| CsvColumn {
                index,
                name: name.clone(),
                sample_values: parsed
                    .rows
                    .iter()
                    .take(PREVIEW_ROWS)
                    .filter_map(|row| row.get(index).cloned())
                    .collect(),
                suggested: mapping.get(index),
            })
            .collect();

        Self {
            columns,
            row_count: parsed.row_count(),
            delimiter: parsed.delimiter,
        }
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub ok: usize,
    pub failed: usize,
    /// Records as returned by the store, in file order.
    pub created: Vec<Customer>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.ok + self.failed
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Build the creation payload for one data row.
///
/// Ignored columns and blank cells are skipped, status values are matched
/// case-insensitively with `Uusi` as the fallback, and everything else is
/// copied trimmed. Returns `None` when the row has no name.
pub fn build_customer(row: &[String], mapping: &ColumnMapping) -> Option<NewCustomer> {
    let mut customer = NewCustomer::default();

    for (column, cell) in row.iter().enumerate() {
        let value = cell.trim();
        if value.is_empty() {
            continue;
        }

        match mapping.get(column) {
            CrmField::Ignore => {}
            CrmField::Status => {
                customer.status = CustomerStatus::from_loose(value).unwrap_or_default();
            }
            CrmField::Name => customer.name = value.to_string(),
            CrmField::Email => customer.email = Some(value.to_string()),
            CrmField::Phone => customer.phone = Some(value.to_string()),
            CrmField::Segment => customer.segment = Some(value.to_string()),
            CrmField::Source => customer.source = Some(value.to_string()),
            CrmField::City => customer.city = Some(value.to_string()),
            CrmField::Industry => customer.industry = Some(value.to_string()),
        }
    }

    if customer.name.is_empty() {
        None
    } else {
        Some(customer)
    }
}

// ============================================================================
// Importer
// ============================================================================

/// Creates customers from parsed rows against an explicitly supplied store.
pub struct CsvImporter<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> CsvImporter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Import every row, one creation at a time.
    ///
    /// Fails only when the mapping is unusable, before anything is sent.
    /// Rows without a name and rows the store rejects are counted as failed.
    pub async fn import(&self, parsed: &ParsedCsv, mapping: &ColumnMapping) -> Result<ImportSummary> {
        mapping.validate()?;

        log::info!(
            "Importing {} rows into {}",
            parsed.row_count(),
            collections::CUSTOMERS
        );

        let mut summary = ImportSummary::default();

        for (index, row) in parsed.rows.iter().enumerate() {
            // 1-based data row; blank lines are not counted.
            let row_number = index + 1;

            let Some(customer) = build_customer(row, mapping) else {
                log::debug!("Row {}: no name, skipped", row_number);
                summary.failed += 1;
                continue;
            };

            let body = serde_json::to_value(&customer)?;
            match self.store.create(collections::CUSTOMERS, &body).await {
                Ok(record) => {
                    summary.ok += 1;
                    match serde_json::from_value::<Customer>(record) {
                        Ok(created) => summary.created.push(created),
                        Err(e) => log::debug!("Row {}: created record not readable: {}", row_number, e),
                    }
                }
                Err(e) => {
                    log::warn!("Row {}: store rejected '{}': {}", row_number, customer.name, e);
                    summary.failed += 1;
                }
            }
        }

        log::info!(
            "Import finished: {} created, {} failed",
            summary.ok,
            summary.failed
        );
        Ok(summary)
    }
}

// ============================================================================
// Session
// ============================================================================

/// One file being imported: preview, editable mapping, run and close.
#[derive(Debug, Clone)]
pub struct ImportSession {
    parsed: ParsedCsv,
    mapping: ColumnMapping,
    preview: CsvPreview,
}

impl ImportSession {
    /// Start a session with the mapping suggested by the headers.
    pub fn new(parsed: ParsedCsv) -> Self {
        let mapping = ColumnMapping::infer(&parsed.headers);
        let preview = CsvPreview::build(&parsed, &mapping);
        Self {
            parsed,
            mapping,
            preview,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(read_csv_file(path)?))
    }

    pub fn parsed(&self) -> &ParsedCsv {
        &self.parsed
    }

    pub fn preview(&self) -> &CsvPreview {
        &self.preview
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn set_field(&mut self, column: usize, field: CrmField) -> Result<()> {
        self.mapping.set(column, field)
    }

    pub fn apply_override(&mut self, entry: &str) -> Result<()> {
        self.mapping.apply_override(entry)
    }

    /// Run the import. `on_imported` receives the created customers and is
    /// only called when at least one record was created.
    pub async fn run<S, F>(&self, store: &S, on_imported: F) -> Result<ImportSummary>
    where
        S: RecordStore + ?Sized,
        F: FnOnce(&[Customer]),
    {
        let summary = CsvImporter::new(store)
            .import(&self.parsed, &self.mapping)
            .await?;
        if summary.ok > 0 {
            on_imported(&summary.created);
        }
        Ok(summary)
    }

    /// Discard the session.
    pub fn close<F: FnOnce()>(self, on_close: F) {
        log::debug!("Import session closed ({} rows)", self.parsed.row_count());
        on_close();
    }
}
