//! Match-or-insert loop for parsed statements

use anyhow::Context;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ImportProfile;
use crate::db::{self, Transaction};
use crate::detail_types::DetailTypeRegistry;
use crate::duplicates::DuplicateMatcher;
use crate::error::Result;
use crate::importers::{self, ColumnMapping, Statement, StatementFile, StatementRow};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Classify rows against the store without writing anything
    pub dry_run: bool,
}

/// A statement row that was skipped because it is already stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRow {
    pub line: usize,
    /// Ids of the stored transactions it matched
    pub matches: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub inserted: usize,
    pub duplicates: Vec<DuplicateRow>,
    pub details_written: usize,
    pub dry_run: bool,
    pub import_id: Option<i64>,
}

/// Insert one row and its non-empty detail values.
///
/// Returns the new transaction id and the number of detail rows written.
pub fn insert_row(
    conn: &Connection,
    registry: &mut DetailTypeRegistry,
    row: &StatementRow,
    import_id: Option<i64>,
) -> Result<(i64, usize)> {
    let tx = Transaction {
        id: None,
        booking_date: row.booking_date,
        value_date: row.value_date,
        amount: row.amount,
        direction: row.direction,
        import_id,
        created_at: Utc::now(),
    };
    let tx_id = db::insert_transaction(conn, &tx)
        .context(format!("Failed to insert transaction from line {}", row.line))?;

    let mut written = 0;
    for (label, value) in &row.details {
        if value.is_empty() {
            continue;
        }
        let type_id = registry.get_or_create(conn, label)?;
        db::insert_transaction_detail(conn, tx_id, type_id, value)?;
        written += 1;
    }

    Ok((tx_id, written))
}

/// Run every statement row through the duplicate matcher and insert the rest.
///
/// Each row commits on its own; a failure part-way leaves the earlier rows
/// stored.
pub fn import_statement(
    conn: &Connection,
    statement: &Statement,
    mapping: &ColumnMapping,
    options: ImportOptions,
    import_id: Option<i64>,
) -> Result<ImportSummary> {
    let matcher = DuplicateMatcher::new(mapping.uniqueness_cols.clone());
    for missing in matcher.missing_columns(statement) {
        warn!(
            "Uniqueness column '{}' is not in the statement, treating it as empty",
            missing
        );
    }

    let mut registry = if options.dry_run {
        DetailTypeRegistry::lookup(conn, &statement.detail_columns)?
    } else {
        DetailTypeRegistry::sync(conn, &statement.detail_columns)?
    };

    let mut summary = ImportSummary {
        rows: statement.rows.len(),
        dry_run: options.dry_run,
        import_id,
        ..ImportSummary::default()
    };

    for row in &statement.rows {
        let matches = matcher.find_duplicates(conn, &registry, row)?;
        if !matches.is_empty() {
            warn!(
                "Line {}: duplicate of stored transaction(s) {:?}, skipping",
                row.line, matches
            );
            summary.duplicates.push(DuplicateRow {
                line: row.line,
                matches,
            });
            continue;
        }

        if options.dry_run {
            summary.inserted += 1;
            summary.details_written += row.details.values().filter(|v| !v.is_empty()).count();
            continue;
        }

        let (_, written) = insert_row(conn, &mut registry, row, import_id)?;
        summary.inserted += 1;
        summary.details_written += written;
    }

    info!(
        "Import finished: {} rows, {} inserted, {} duplicates",
        summary.rows,
        summary.inserted,
        summary.duplicates.len()
    );
    Ok(summary)
}

/// Load a statement file, import it and record the import batch
pub fn import_file<P: AsRef<Path>>(
    conn: &Connection,
    file_path: P,
    profile: &ImportProfile,
    options: ImportOptions,
) -> Result<ImportSummary> {
    let file = importers::load_statement_file(file_path, profile)?;
    import_loaded(conn, &file, &profile.columns, options)
}

/// Import an already loaded statement file and record the import batch.
///
/// The batch counts are written even when a row fails part-way; rows read is
/// the statement size and rows inserted is what the batch actually stored.
pub fn import_loaded(
    conn: &Connection,
    file: &StatementFile,
    mapping: &ColumnMapping,
    options: ImportOptions,
) -> Result<ImportSummary> {
    if options.dry_run {
        return import_statement(conn, &file.statement, mapping, options, None);
    }

    let import_id = db::insert_import_batch(conn, &file.filename, &file.checksum)?;
    info!(
        "Recorded import batch {} for {} ({})",
        import_id, file.filename, file.checksum
    );

    match import_statement(conn, &file.statement, mapping, options, Some(import_id)) {
        Ok(summary) => {
            db::finish_import_batch(
                conn,
                import_id,
                summary.rows,
                summary.inserted,
                summary.duplicates.len(),
            )?;
            Ok(summary)
        }
        Err(e) => {
            let inserted = db::count_transactions_for_import(conn, import_id)?;
            warn!(
                "Import batch {} aborted after {} inserted rows",
                import_id, inserted
            );
            db::finish_import_batch(
                conn,
                import_id,
                file.statement.rows.len(),
                inserted as usize,
                0,
            )?;
            Err(e.context(format!("Import of {} aborted", file.filename)))
        }
    }
}
