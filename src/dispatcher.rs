//! Command dispatcher that routes parsed clap commands to their handlers.

use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::formatters;
use crate::cli::Commands;
use crate::config::{self, ProfileOverrides};
use crate::db;
use crate::error::Result;
use crate::importers;
use crate::ingest::{self, ImportOptions};

/// Route a parsed command to its handler
pub fn dispatch_command(command: Commands, db_path: Option<PathBuf>, json_output: bool) -> Result<()> {
    match command {
        Commands::Init => dispatch_init(db_path, json_output),
        Commands::Import {
            file,
            profile,
            dry_run,
            overrides,
        } => dispatch_import(
            &file,
            profile.as_deref(),
            overrides.into(),
            dry_run,
            db_path,
            json_output,
        ),
        Commands::Profile { profile, overrides } => {
            dispatch_profile(profile.as_deref(), overrides.into())
        }
        Commands::DetailTypes => dispatch_detail_types(db_path, json_output),
        Commands::Count => dispatch_count(db_path, json_output),
    }
}

fn dispatch_init(db_path: Option<PathBuf>, json_output: bool) -> Result<()> {
    let path = match db_path {
        Some(p) => p,
        None => db::get_default_db_path()?,
    };
    db::init_database(Some(path.clone()))?;

    if json_output {
        println!(
            "{}",
            serde_json::json!({ "database": path.display().to_string() })
        );
    } else {
        println!(
            "{} Database ready at {}",
            "✓".green().bold(),
            path.display()
        );
    }
    Ok(())
}

fn dispatch_import(
    file: &Path,
    profile_path: Option<&Path>,
    overrides: ProfileOverrides,
    dry_run: bool,
    db_path: Option<PathBuf>,
    json_output: bool,
) -> Result<()> {
    info!("Importing from: {:?}", file);

    let profile = config::load_profile(profile_path)?.with_overrides(&overrides)?;

    let loaded = importers::load_statement_file(file, &profile)?;
    if !json_output {
        print!("{}", formatters::format_statement_preview(&loaded.statement));
    }

    let path = match db_path {
        Some(p) => p,
        None => db::get_default_db_path()?,
    };
    // a dry run never creates the database file
    let conn = if dry_run && !path.exists() {
        db::open_memory_db()?
    } else {
        db::init_database(Some(path.clone()))?;
        db::open_db(Some(path))?
    };

    let summary = ingest::import_loaded(&conn, &loaded, &profile.columns, ImportOptions { dry_run })?;

    if json_output {
        println!("{}", formatters::format_import_json(&summary));
    } else {
        print!("{}", formatters::format_import_summary(&summary));
    }
    Ok(())
}

fn dispatch_profile(profile_path: Option<&Path>, overrides: ProfileOverrides) -> Result<()> {
    let profile = config::load_profile(profile_path)?.with_overrides(&overrides)?;
    print!("{}", profile.to_toml_string()?);
    Ok(())
}

fn dispatch_detail_types(db_path: Option<PathBuf>, json_output: bool) -> Result<()> {
    db::init_database(db_path.clone())?;
    let conn = db::open_db(db_path)?;
    let types = db::list_detail_types(&conn)?;

    if json_output {
        println!("{}", formatters::format_detail_types_json(&types));
    } else {
        print!("{}", formatters::format_detail_types_table(&types));
    }
    Ok(())
}

fn dispatch_count(db_path: Option<PathBuf>, json_output: bool) -> Result<()> {
    db::init_database(db_path.clone())?;
    let conn = db::open_db(db_path)?;
    let count = db::count_transactions(&conn)?;

    if json_output {
        println!("{}", formatters::format_count_json(count));
    } else {
        println!("{} transactions stored", count.to_string().bold());
    }
    Ok(())
}
