//! Output formatting module for CLI display
//!
//! Keeps terminal tables and JSON rendering out of the import pipeline.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::db::{Direction, TransactionDetailType};
use crate::importers::Statement;
use crate::ingest::ImportSummary;
use crate::utils::format_amount;

const PREVIEW_ROWS: usize = 10;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Table of the first statement rows
pub fn format_statement_preview(statement: &Statement) -> String {
    #[derive(Tabled)]
    struct PreviewRow {
        #[tabled(rename = "Line")]
        line: usize,
        #[tabled(rename = "Booking")]
        booking_date: String,
        #[tabled(rename = "Value")]
        value_date: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Details")]
        details: String,
    }

    let rows: Vec<PreviewRow> = statement
        .rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| {
            let amount = match row.direction {
                Direction::Debit => format!("-{}", format_amount(row.amount)).red().to_string(),
                Direction::Credit => format_amount(row.amount).green().to_string(),
            };
            let details = row
                .details
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            PreviewRow {
                line: row.line,
                booking_date: row.booking_date.format("%d.%m.%Y").to_string(),
                value_date: row.value_date.format("%d.%m.%Y").to_string(),
                amount,
                details,
            }
        })
        .collect();

    let mut output = format!(
        "\n{} Found {} rows\n\n",
        "✓".green().bold(),
        statement.rows.len()
    );

    if !rows.is_empty() {
        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        table.modify(Columns::new(3..4), Alignment::right());
        output.push_str(&table.to_string());
        output.push('\n');
    }

    if statement.rows.len() > PREVIEW_ROWS {
        output.push_str(&format!(
            "\n... and {} more rows\n",
            statement.rows.len() - PREVIEW_ROWS
        ));
    }

    output
}

/// Human readable result of an import
pub fn format_import_summary(summary: &ImportSummary) -> String {
    let mut output = String::new();

    if summary.dry_run {
        output.push_str(&format!(
            "\n{} Dry run - no changes saved\n",
            "ℹ".blue().bold()
        ));
        output.push_str(&format!("  Rows read:       {}\n", summary.rows));
        output.push_str(&format!(
            "  Would insert:    {}\n",
            summary.inserted.to_string().green()
        ));
    } else {
        output.push_str(&format!("\n{} Import complete!\n", "✓".green().bold()));
        output.push_str(&format!("  Rows read:       {}\n", summary.rows));
        output.push_str(&format!(
            "  Imported:        {}\n",
            summary.inserted.to_string().green()
        ));
        output.push_str(&format!("  Details written: {}\n", summary.details_written));
    }

    if !summary.duplicates.is_empty() {
        output.push_str(&format!(
            "  Skipped (duplicates): {}\n",
            summary.duplicates.len().to_string().yellow()
        ));
        for dup in &summary.duplicates {
            let ids = dup
                .matches
                .iter()
                .map(|id| format!("#{}", id))
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!(
                "    line {} matches {}\n",
                dup.line,
                ids.bright_black()
            ));
        }
    }

    output
}

pub fn format_import_json(summary: &ImportSummary) -> String {
    to_json(summary)
}

pub fn format_detail_types_table(types: &[TransactionDetailType]) -> String {
    if types.is_empty() {
        return format!(
            "{} No detail types registered\nImport a statement first using: {} import <file>\n",
            "ℹ".blue().bold(),
            "bankfeed".bold()
        );
    }

    #[derive(Tabled)]
    struct DetailTypeRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Label")]
        label: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let rows: Vec<DetailTypeRow> = types
        .iter()
        .map(|t| DetailTypeRow {
            id: t.id.map(|id| id.to_string()).unwrap_or_default(),
            label: t.label.clone(),
            description: t.description.clone(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(0..1), Alignment::right());
    format!("{}\n", table)
}

pub fn format_detail_types_json(types: &[TransactionDetailType]) -> String {
    to_json(&types)
}

pub fn format_count_json(count: i64) -> String {
    #[derive(Serialize)]
    struct JsonCount {
        transactions: i64,
    }
    to_json(&JsonCount {
        transactions: count,
    })
}
