//! bankfeed - bank statement CSV importer
//!
//! Maps the columns of bank statement exports onto a fixed transaction
//! schema, keeps every other column as a transaction detail, and stores the
//! result in SQLite while skipping rows that were imported before.

pub mod cli;
pub mod config;
pub mod db;
pub mod detail_types;
pub mod dispatcher;
pub mod duplicates;
pub mod error;
pub mod importers;
pub mod ingest;
pub mod utils;
