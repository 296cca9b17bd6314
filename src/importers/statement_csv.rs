use anyhow::Context;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::Encoding;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use super::column_mapping::{ColumnMapping, MappedColumn};
use crate::db::Direction;
use crate::error::{IngestError, Result};
use crate::utils::canonical_amount;

/// How the delimited text is encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvParams {
    pub separator: char,
    /// WHATWG encoding label, e.g. "iso-8859-1", "utf-8", "windows-1252"
    pub encoding: String,
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
}

impl Default for CsvParams {
    fn default() -> Self {
        Self {
            separator: ';',
            encoding: "iso-8859-1".to_string(),
            decimal_separator: ',',
            thousands_separator: None,
        }
    }
}

impl CsvParams {
    /// Reject separator combinations that would make amounts ambiguous
    pub fn validate(&self) -> Result<()> {
        if self.thousands_separator == Some(self.decimal_separator) {
            return Err(IngestError::Config(format!(
                "decimal separator and thousands separator are both {:?}",
                self.decimal_separator
            ))
            .into());
        }
        Ok(())
    }
}

/// One parsed statement line
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    /// Line in the source file (1-based, header is line 1)
    pub line: usize,
    pub booking_date: NaiveDate,
    pub value_date: NaiveDate,
    /// Unsigned magnitude in canonical form
    pub amount: Decimal,
    pub direction: Direction,
    /// Detail column label -> raw value (empty values included)
    pub details: BTreeMap<String, String>,
}

impl StatementRow {
    /// Value of a detail column, empty when the column is absent
    pub fn detail(&self, label: &str) -> &str {
        self.details.get(label).map(String::as_str).unwrap_or("")
    }
}

/// A fully parsed statement file
#[derive(Debug, Clone, Default)]
pub struct Statement {
    /// Cleaned names of all non-schema columns, in file order
    pub detail_columns: Vec<String>,
    pub rows: Vec<StatementRow>,
}

#[derive(Debug)]
struct StatementColumns {
    amount: usize,
    booking_date: usize,
    value_date: usize,
    details: Vec<(usize, String)>,
}

/// Parse a bank statement CSV file
pub fn parse_statement_csv<P: AsRef<Path>>(
    file_path: P,
    params: &CsvParams,
    mapping: &ColumnMapping,
) -> Result<Statement> {
    let path = file_path.as_ref();
    info!("Parsing statement CSV file: {:?}", path);

    if !path.is_file() {
        return Err(IngestError::FileNotFound(path.to_path_buf()).into());
    }

    let bytes = std::fs::read(path).context(format!("Failed to read {:?}", path))?;
    parse_statement_bytes(&bytes, params, mapping)
}

/// Parse raw statement bytes in the configured encoding
pub fn parse_statement_bytes(
    bytes: &[u8],
    params: &CsvParams,
    mapping: &ColumnMapping,
) -> Result<Statement> {
    let content = decode_content(bytes, &params.encoding)?;
    parse_statement_str(&content, params, mapping)
}

/// Decode raw file bytes using an encoding label. A byte order mark, if
/// present, overrides the label.
pub fn decode_content(bytes: &[u8], encoding_label: &str) -> Result<String> {
    let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
        .ok_or_else(|| IngestError::UnknownEncoding(encoding_label.to_string()))?;

    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(IngestError::Undecodable(used.name().to_string()).into());
    }
    debug!("Decoded {} bytes as {}", bytes.len(), used.name());

    Ok(decoded.into_owned())
}

/// Parse already decoded statement text
pub fn parse_statement_str(
    content: &str,
    params: &CsvParams,
    mapping: &ColumnMapping,
) -> Result<Statement> {
    params.validate()?;
    let delimiter = separator_byte(params.separator)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    debug!("CSV headers: {:?}", headers);

    let columns = find_columns(&headers, mapping)?;
    debug!("Column mapping: {:?}", columns);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Malformed CSV record after line {}", idx + 1))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        rows.push(parse_row(&record, &columns, params, mapping, line)?);
    }

    info!("Parsed {} statement rows", rows.len());

    Ok(Statement {
        detail_columns: columns.details.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}

fn separator_byte(separator: char) -> Result<u8> {
    if separator.is_ascii() && separator != '"' && separator != '\n' && separator != '\r' {
        Ok(separator as u8)
    } else {
        Err(IngestError::Config(format!(
            "separator {:?} must be a single ASCII character other than quote or newline",
            separator
        ))
        .into())
    }
}

fn find_columns(headers: &StringRecord, mapping: &ColumnMapping) -> Result<StatementColumns> {
    let mut amount_idx = None;
    let mut booking_idx = None;
    let mut value_idx = None;
    let mut details = Vec::new();
    let mut seen = HashSet::new();

    for (idx, header) in headers.iter().enumerate() {
        let mut name = mapping.mapped_name(header);
        if name.is_empty() {
            // trailing separators in bank exports leave nameless columns
            name = format!("column_{}", idx + 1);
        }
        if !seen.insert(name.clone()) {
            return Err(IngestError::DuplicateColumn(name).into());
        }

        if name == MappedColumn::Amount.as_str() {
            amount_idx = Some(idx);
        } else if name == MappedColumn::BookingDate.as_str() {
            booking_idx = Some(idx);
        } else if name == MappedColumn::ValueDate.as_str() {
            value_idx = Some(idx);
        } else if ColumnMapping::is_schema_column(&name) {
            // the direction column is derived; a file column of that name would be shadowed
            return Err(IngestError::DuplicateColumn(name).into());
        } else {
            details.push((idx, name));
        }
    }

    let require = |idx: Option<usize>, column: MappedColumn| -> Result<usize> {
        idx.ok_or_else(|| {
            IngestError::MissingColumn {
                column: column.as_str().to_string(),
                expected: mapping.source_name(column).unwrap_or_default().to_string(),
            }
            .into()
        })
    };

    Ok(StatementColumns {
        amount: require(amount_idx, MappedColumn::Amount)?,
        booking_date: require(booking_idx, MappedColumn::BookingDate)?,
        value_date: require(value_idx, MappedColumn::ValueDate)?,
        details,
    })
}

fn parse_row(
    record: &StringRecord,
    columns: &StatementColumns,
    params: &CsvParams,
    mapping: &ColumnMapping,
    line: usize,
) -> Result<StatementRow> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let booking_date = parse_date(field(columns.booking_date), mapping, MappedColumn::BookingDate, line)?;
    let value_date = parse_date(field(columns.value_date), mapping, MappedColumn::ValueDate, line)?;

    let raw_amount = field(columns.amount);
    let signed = parse_amount(raw_amount, params).ok_or_else(|| IngestError::InvalidAmount {
        line,
        value: raw_amount.to_string(),
    })?;

    let details = columns
        .details
        .iter()
        .map(|(idx, name)| (name.clone(), field(*idx).to_string()))
        .collect();

    Ok(StatementRow {
        line,
        booking_date,
        value_date,
        amount: canonical_amount(signed.abs()),
        direction: Direction::from_signed_amount(signed),
        details,
    })
}

fn parse_date(
    raw: &str,
    mapping: &ColumnMapping,
    column: MappedColumn,
    line: usize,
) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), &mapping.date_format).map_err(|_| {
        IngestError::InvalidDate {
            line,
            column: column.as_str().to_string(),
            value: raw.to_string(),
            format: mapping.date_format.clone(),
        }
        .into()
    })
}

/// Parse a signed amount written with the configured separators
///
/// Returns None when the text is not a number under that convention.
pub fn parse_amount(raw: &str, params: &CsvParams) -> Option<Decimal> {
    let mut text = raw.trim().to_string();
    if let Some(sep) = params.thousands_separator {
        text = text.replace(sep, "");
    }
    if params.decimal_separator != '.' {
        if text.contains('.') {
            return None;
        }
        text = text.replace(params.decimal_separator, ".");
    }
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text).ok()
}
