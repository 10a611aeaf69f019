//! Column → customer field mapping.
//!
//! Header names are matched against a fixed alias table (Finnish and English
//! spellings). The result is only a suggestion: every column can be remapped
//! before the import runs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CrmError, Result};

/// Destination of one CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CrmField {
    #[default]
    Ignore,
    Name,
    Email,
    Phone,
    Status,
    Segment,
    Source,
    City,
    Industry,
}

impl CrmField {
    /// Selectable targets, in the order the mapping dialog lists them.
    pub const ALL: [CrmField; 9] = [
        Self::Ignore,
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Status,
        Self::Segment,
        Self::Source,
        Self::City,
        Self::Industry,
    ];

    /// Field name in the customers collection; `None` for ignored columns.
    pub fn store_field(&self) -> Option<&'static str> {
        match self {
            Self::Ignore => None,
            Self::Name => Some("name"),
            Self::Email => Some("email"),
            Self::Phone => Some("phone"),
            Self::Status => Some("status"),
            Self::Segment => Some("segmentti"),
            Self::Source => Some("lahde"),
            Self::City => Some("kaupunki"),
            Self::Industry => Some("toimiala"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignore => "(ohita)",
            Self::Name => "Nimi *",
            Self::Email => "Sähköposti",
            Self::Phone => "Puhelin",
            Self::Status => "Tila",
            Self::Segment => "Segmentti",
            Self::Source => "Lähde",
            Self::City => "Kaupunki",
            Self::Industry => "Toimiala",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Status => "status",
            Self::Segment => "segment",
            Self::Source => "source",
            Self::City => "city",
            Self::Industry => "industry",
        }
    }
}

impl fmt::Display for CrmField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the English names, the store field names and `-` for ignore.
impl FromStr for CrmField {
    type Err = CrmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if wanted == "-" {
            return Ok(Self::Ignore);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted || f.store_field() == Some(wanted.as_str()))
            .ok_or_else(|| CrmError::invalid("CRM field", s))
    }
}

// `.` stands for a single character so that headers with a mangled ä/ö
// ("shkposti", "s?hk?posti") still match.
static HEADER_ALIASES: Lazy<Vec<(CrmField, Regex)>> = Lazy::new(|| {
    [
        (CrmField::Name, r"^(nimi|name|yritys|company|asiakas|firma)$"),
        (CrmField::Email, r"^(s.hk.posti|email|mail|e-mail|sposti)$"),
        (CrmField::Phone, r"^(puhelin|phone|tel|puh|gsm|numero)$"),
        (CrmField::Status, r"^(tila|status|vaihe|stage)$"),
        (CrmField::Segment, r"^(segmentti|segment|ryhm.)$"),
        (CrmField::Source, r"^(l.hde|lahde|source|kanava)$"),
        (CrmField::City, r"^(kaupunki|city|paikkakunta|kunta)$"),
        (CrmField::Industry, r"^(toimiala|industry|ala|sector)$"),
    ]
    .into_iter()
    .map(|(field, pattern)| (field, Regex::new(&format!("(?i){}", pattern)).unwrap()))
    .collect()
});

/// Suggest a destination for a header cell.
pub fn guess_field(header: &str) -> CrmField {
    let normalized = header.trim().to_lowercase();
    HEADER_ALIASES
        .iter()
        .find(|(_, re)| re.is_match(&normalized))
        .map(|(field, _)| *field)
        .unwrap_or(CrmField::Ignore)
}

/// One destination per CSV column, index-aligned with the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ColumnMapping {
    fields: Vec<CrmField>,
}

impl ColumnMapping {
    pub fn new(fields: Vec<CrmField>) -> Self {
        Self { fields }
    }

    /// Mapping suggested by the header names.
    pub fn infer(headers: &[String]) -> Self {
        Self {
            fields: headers.iter().map(|h| guess_field(h)).collect(),
        }
    }

    pub fn fields(&self) -> &[CrmField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, column: usize) -> CrmField {
        self.fields.get(column).copied().unwrap_or(CrmField::Ignore)
    }

    /// Override the destination of one column.
    pub fn set(&mut self, column: usize, field: CrmField) -> Result<()> {
        let columns = self.fields.len();
        let slot = self
            .fields
            .get_mut(column)
            .ok_or(CrmError::ColumnOutOfRange { column, columns })?;
        *slot = field;
        Ok(())
    }

    /// Apply an override written as `COLUMN=FIELD`, e.g. `3=email` or `0=-`.
    pub fn apply_override(&mut self, entry: &str) -> Result<()> {
        let (column, field) = entry
            .split_once('=')
            .ok_or_else(|| CrmError::invalid("column override", entry))?;
        let column: usize = column
            .trim()
            .parse()
            .map_err(|_| CrmError::invalid("column index", column))?;
        let field: CrmField = field.parse()?;
        self.set(column, field)
    }

    /// Columns currently mapped to `field`.
    pub fn columns_for(&self, field: CrmField) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| **f == field)
            .map(|(i, _)| i)
            .collect()
    }

    /// The mapping is importable when exactly one column holds the name.
    pub fn validate(&self) -> Result<usize> {
        let name_columns = self.columns_for(CrmField::Name);
        match name_columns.as_slice() {
            [] => Err(CrmError::MissingNameColumn),
            [column] => Ok(*column),
            _ => Err(CrmError::DuplicateNameColumn(name_columns)),
        }
    }
}
