// Import module - bank statement parsers

pub mod column_mapping;
pub mod statement_csv;

use anyhow::{anyhow, Context};
use std::path::Path;
use tracing::info;

use crate::config::ImportProfile;
use crate::error::{IngestError, Result};

pub use column_mapping::{clean_name, ColumnMapping, MappedColumn};
pub use statement_csv::{CsvParams, Statement, StatementRow};

/// A parsed statement together with the identity of the file it came from
#[derive(Debug, Clone)]
pub struct StatementFile {
    pub filename: String,
    /// BLAKE3 hex digest of the raw file bytes
    pub checksum: String,
    pub statement: Statement,
}

/// Load a statement file using an import profile (dispatches on extension)
pub fn load_statement<P: AsRef<Path>>(file_path: P, profile: &ImportProfile) -> Result<Statement> {
    Ok(load_statement_file(file_path, profile)?.statement)
}

/// Read a statement file once, checksum the bytes and parse them
pub fn load_statement_file<P: AsRef<Path>>(
    file_path: P,
    profile: &ImportProfile,
) -> Result<StatementFile> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension: {:?}", path))?
        .to_lowercase();

    info!("Loading statement: {:?} (type: {})", path, extension);

    if !matches!(extension.as_str(), "csv" | "txt" | "tsv") {
        return Err(anyhow!(
            "Unsupported file format: {}. Supported formats: .csv, .txt, .tsv",
            extension
        ));
    }
    if !path.is_file() {
        return Err(IngestError::FileNotFound(path.to_path_buf()).into());
    }

    let bytes = std::fs::read(path).context(format!("Failed to read {:?}", path))?;
    let statement = statement_csv::parse_statement_bytes(&bytes, &profile.csv, &profile.columns)?;

    Ok(StatementFile {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        checksum: blake3::hash(&bytes).to_hex().to_string(),
        statement,
    })
}
