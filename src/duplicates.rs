//! Duplicate detection against stored transactions
//!
//! A statement row is a duplicate of a stored transaction when amount, both
//! dates and direction are equal and every configured uniqueness column
//! carries the same value. Details that were never stored count as empty.

use anyhow::Context;
use rusqlite::Connection;
use std::collections::HashMap;

use crate::db;
use crate::detail_types::DetailTypeRegistry;
use crate::error::Result;
use crate::importers::{Statement, StatementRow};

#[derive(Debug, Clone, Default)]
pub struct DuplicateMatcher {
    uniqueness_cols: Vec<String>,
}

impl DuplicateMatcher {
    pub fn new(uniqueness_cols: Vec<String>) -> Self {
        Self { uniqueness_cols }
    }

    pub fn uniqueness_cols(&self) -> &[String] {
        &self.uniqueness_cols
    }

    /// Uniqueness columns that the statement does not contain
    pub fn missing_columns<'a>(&'a self, statement: &Statement) -> Vec<&'a str> {
        self.uniqueness_cols
            .iter()
            .filter(|col| !statement.detail_columns.contains(col))
            .map(String::as_str)
            .collect()
    }

    /// Ids of stored transactions the row duplicates (ascending)
    pub fn find_duplicates(
        &self,
        conn: &Connection,
        registry: &DetailTypeRegistry,
        row: &StatementRow,
    ) -> Result<Vec<i64>> {
        let candidates = db::find_matching_transactions(
            conn,
            row.amount,
            row.booking_date,
            row.value_date,
            row.direction,
        )
        .context(format!("Failed to look up duplicates for line {}", row.line))?;

        if self.uniqueness_cols.is_empty() || candidates.is_empty() {
            return Ok(candidates);
        }

        let mut matches = Vec::new();
        for candidate in candidates {
            let stored = stored_details(conn, registry, candidate)?;
            let all_equal = self.uniqueness_cols.iter().all(|col| {
                let stored_value = stored.get(col.as_str()).map(String::as_str).unwrap_or("");
                stored_value == row.detail(col)
            });
            if all_equal {
                matches.push(candidate);
            }
        }

        Ok(matches)
    }
}

/// Detail values of a stored transaction keyed by label
fn stored_details(
    conn: &Connection,
    registry: &DetailTypeRegistry,
    transaction_id: i64,
) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for detail in db::get_transaction_details(conn, transaction_id)? {
        let label = match registry.label_for(detail.transaction_detail_type_id) {
            Some(label) => label.to_string(),
            None => match db::find_detail_type_label(conn, detail.transaction_detail_type_id)? {
                Some(label) => label,
                None => continue,
            },
        };
        values.insert(label, detail.description);
    }
    Ok(values)
}
