use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ProfileOverrides;

pub mod formatters;

#[derive(Parser)]
#[command(name = "bankfeed")]
#[command(
    version,
    about = "Bank statement CSV importer with duplicate detection"
)]
#[command(
    long_about = "Import bank statement CSV exports into a local SQLite database. Columns are mapped onto a fixed transaction schema, every other column is kept as a transaction detail, and rows already stored are detected and skipped."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Database file (default: ~/.bankfeed/data.db)
    #[arg(long = "db", global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and schema
    Init,

    /// Import a bank statement CSV file
    Import {
        /// Path to the statement file (.csv, .txt or .tsv)
        file: PathBuf,

        /// Import profile (TOML). Defaults to <config dir>/bankfeed/profile.toml
        #[arg(short, long, value_name = "FILE")]
        profile: Option<PathBuf>,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,

        #[command(flatten)]
        overrides: ImportOverrideArgs,
    },

    /// Show the effective import profile as TOML
    Profile {
        /// Import profile (TOML) to show instead of the default one
        #[arg(short, long, value_name = "FILE")]
        profile: Option<PathBuf>,

        #[command(flatten)]
        overrides: ImportOverrideArgs,
    },

    /// List registered transaction detail types
    DetailTypes,

    /// Show the number of stored transactions
    Count,
}

/// Flags that override individual profile settings
#[derive(clap::Args, Debug, Default)]
pub struct ImportOverrideArgs {
    /// Field separator
    #[arg(long, value_name = "CHAR")]
    pub separator: Option<char>,

    /// Character encoding label (e.g. utf-8, iso-8859-1)
    #[arg(long, value_name = "LABEL")]
    pub encoding: Option<String>,

    /// Decimal separator of amounts
    #[arg(long, value_name = "CHAR")]
    pub decimal_separator: Option<char>,

    /// Date format of both date columns (chrono syntax, e.g. %d.%m.%Y)
    #[arg(long, value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// Header of the amount column
    #[arg(long, value_name = "NAME")]
    pub amount_col: Option<String>,

    /// Header of the booking date column
    #[arg(long, value_name = "NAME")]
    pub booking_date_col: Option<String>,

    /// Header of the value date column
    #[arg(long, value_name = "NAME")]
    pub value_date_col: Option<String>,

    /// Header of the category column
    #[arg(long, value_name = "NAME")]
    pub category_col: Option<String>,

    /// Detail column that must match for a duplicate (repeatable)
    #[arg(long = "unique", value_name = "COL")]
    pub unique: Vec<String>,
}

impl From<ImportOverrideArgs> for ProfileOverrides {
    fn from(args: ImportOverrideArgs) -> Self {
        ProfileOverrides {
            separator: args.separator,
            encoding: args.encoding,
            decimal_separator: args.decimal_separator,
            date_format: args.date_format,
            amount_col: args.amount_col,
            booking_date_col: args.booking_date_col,
            value_date_col: args.value_date_col,
            category_col: args.category_col,
            uniqueness_cols: args.unique,
        }
    }
}
