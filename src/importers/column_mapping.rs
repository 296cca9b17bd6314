//! Header normalization and canonical column resolution
//!
//! Bank exports name the same field differently ("Betrag", "Amount",
//! "Buchungstag", ...). A [`ColumnMapping`] turns every raw header into a
//! cleaned name and substitutes the canonical schema name for the columns the
//! transaction table needs. Everything else stays a detail column.

use serde::{Deserialize, Serialize};

/// Canonical columns of the transaction schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappedColumn {
    Amount,
    BookingDate,
    ValueDate,
    Category,
    /// Derived from the amount sign, never read from the file
    Direction,
}

impl MappedColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappedColumn::Amount => "amount",
            MappedColumn::BookingDate => "booking_date",
            MappedColumn::ValueDate => "value_date",
            MappedColumn::Category => "category",
            MappedColumn::Direction => "tr_type",
        }
    }

    /// Columns stored on the transaction row itself
    pub fn schema_columns() -> [MappedColumn; 4] {
        [
            MappedColumn::Amount,
            MappedColumn::BookingDate,
            MappedColumn::ValueDate,
            MappedColumn::Direction,
        ]
    }
}

/// Trim, lower-case and replace spaces with underscores
pub fn clean_name(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Column layout of one bank's export
///
/// Keys missing from a profile fall back to [`ColumnMapping::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    #[serde(rename = "amount")]
    pub amount_col: String,
    #[serde(rename = "booking_date")]
    pub booking_date_col: String,
    #[serde(rename = "value_date")]
    pub value_date_col: String,
    #[serde(rename = "category")]
    pub category_col: Option<String>,
    /// chrono format string used for both date columns
    pub date_format: String,
    /// Detail columns that must also match for a row to count as a duplicate
    #[serde(rename = "uniqueness")]
    pub uniqueness_cols: Vec<String>,
}

impl Default for ColumnMapping {
    /// German savings-bank CSV-CAMT layout
    fn default() -> Self {
        Self::new(
            "Betrag",
            "Buchungstag",
            "Valutadatum",
            None,
            "%d.%m.%y",
            &[
                "Buchungstext",
                "Verwendungszweck",
                "Beguenstigter/Zahlungspflichtiger",
                "Kontonummer/IBAN",
            ],
        )
    }
}

impl ColumnMapping {
    /// Build a mapping; every configured name is cleaned the same way headers are.
    pub fn new(
        amount_col: &str,
        booking_date_col: &str,
        value_date_col: &str,
        category_col: Option<&str>,
        date_format: &str,
        uniqueness_cols: &[&str],
    ) -> Self {
        Self {
            amount_col: amount_col.to_string(),
            booking_date_col: booking_date_col.to_string(),
            value_date_col: value_date_col.to_string(),
            category_col: category_col.map(str::to_string),
            date_format: date_format.to_string(),
            uniqueness_cols: uniqueness_cols.iter().map(|c| c.to_string()).collect(),
        }
        .normalized()
    }

    /// Clean all configured column names. Profiles loaded from disk go
    /// through this too, so "Betrag" in a profile matches a "BETRAG " header.
    pub fn normalized(mut self) -> Self {
        self.amount_col = clean_name(&self.amount_col);
        self.booking_date_col = clean_name(&self.booking_date_col);
        self.value_date_col = clean_name(&self.value_date_col);
        self.category_col = self
            .category_col
            .as_deref()
            .map(clean_name)
            .filter(|c| !c.is_empty());

        // Uniqueness columns name detail labels, so a configured category
        // header becomes "category". Schema columns are already part of the
        // base match and are dropped.
        let raw_uniqueness = std::mem::take(&mut self.uniqueness_cols);
        let mut seen = Vec::with_capacity(raw_uniqueness.len());
        for col in raw_uniqueness.iter().map(|c| self.mapped_name(c)) {
            if col.is_empty() || Self::is_schema_column(&col) || seen.contains(&col) {
                continue;
            }
            seen.push(col);
        }
        self.uniqueness_cols = seen;
        self
    }

    /// Clean a raw header and substitute the canonical name if it is mapped
    pub fn mapped_name(&self, raw: &str) -> String {
        let name = clean_name(raw);
        match self.mapped_column(&name) {
            Some(column) => column.as_str().to_string(),
            None => name,
        }
    }

    /// Which canonical column a cleaned header maps to, if any
    pub fn mapped_column(&self, cleaned: &str) -> Option<MappedColumn> {
        if cleaned == self.amount_col {
            Some(MappedColumn::Amount)
        } else if cleaned == self.booking_date_col {
            Some(MappedColumn::BookingDate)
        } else if cleaned == self.value_date_col {
            Some(MappedColumn::ValueDate)
        } else if self.category_col.as_deref() == Some(cleaned) {
            Some(MappedColumn::Category)
        } else {
            None
        }
    }

    /// Configured (cleaned) header name for a canonical column
    pub fn source_name(&self, column: MappedColumn) -> Option<&str> {
        match column {
            MappedColumn::Amount => Some(&self.amount_col),
            MappedColumn::BookingDate => Some(&self.booking_date_col),
            MappedColumn::ValueDate => Some(&self.value_date_col),
            MappedColumn::Category => self.category_col.as_deref(),
            MappedColumn::Direction => None,
        }
    }

    /// True for canonical names stored on the transaction row. Every other
    /// column, the category included, is kept as a detail.
    pub fn is_schema_column(canonical: &str) -> bool {
        MappedColumn::schema_columns()
            .iter()
            .any(|c| c.as_str() == canonical)
    }
}
