//! Import profiles
//!
//! A profile bundles the CSV conventions and the column layout of one bank's
//! export. Profiles are TOML files; anything a profile leaves out falls back
//! to the built-in savings-bank layout, and CLI flags override both.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::importers::{ColumnMapping, CsvParams};

const PROFILE_FILENAME: &str = "profile.toml";

/// CSV conventions plus column layout for one kind of statement file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportProfile {
    pub csv: CsvParams,
    pub columns: ColumnMapping,
}

/// Per-invocation overrides (CLI flags)
#[derive(Debug, Clone, Default)]
pub struct ProfileOverrides {
    pub separator: Option<char>,
    pub encoding: Option<String>,
    pub decimal_separator: Option<char>,
    pub date_format: Option<String>,
    pub amount_col: Option<String>,
    pub booking_date_col: Option<String>,
    pub value_date_col: Option<String>,
    pub category_col: Option<String>,
    /// Replaces the profile's uniqueness columns when non-empty
    pub uniqueness_cols: Vec<String>,
}

impl ImportProfile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let profile: ImportProfile =
            toml::from_str(content).map_err(|e| IngestError::Config(e.to_string()))?;
        profile.csv.validate()?;
        Ok(profile.normalized())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize import profile")
    }

    /// Clean every configured column name (see [`ColumnMapping::normalized`])
    pub fn normalized(mut self) -> Self {
        self.columns = self.columns.normalized();
        self
    }

    /// Apply CLI overrides; the merged CSV settings are validated again
    pub fn with_overrides(mut self, overrides: &ProfileOverrides) -> Result<Self> {
        if let Some(sep) = overrides.separator {
            self.csv.separator = sep;
        }
        if let Some(encoding) = &overrides.encoding {
            self.csv.encoding = encoding.clone();
        }
        if let Some(sep) = overrides.decimal_separator {
            self.csv.decimal_separator = sep;
        }
        if let Some(format) = &overrides.date_format {
            self.columns.date_format = format.clone();
        }
        if let Some(col) = &overrides.amount_col {
            self.columns.amount_col = col.clone();
        }
        if let Some(col) = &overrides.booking_date_col {
            self.columns.booking_date_col = col.clone();
        }
        if let Some(col) = &overrides.value_date_col {
            self.columns.value_date_col = col.clone();
        }
        if let Some(col) = &overrides.category_col {
            self.columns.category_col = Some(col.clone());
        }
        if !overrides.uniqueness_cols.is_empty() {
            self.columns.uniqueness_cols = overrides.uniqueness_cols.clone();
        }
        self.csv.validate()?;
        Ok(self.normalized())
    }
}

/// Profile looked up when no `--profile` is given
/// (`$XDG_CONFIG_HOME/bankfeed/profile.toml` or the platform equivalent)
pub fn get_default_profile_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("bankfeed").join(PROFILE_FILENAME))
}

/// Load the profile to use for an import.
///
/// An explicit path must exist. Without one, the default location is used if
/// a file is there, otherwise the built-in defaults.
pub fn load_profile(path: Option<&Path>) -> Result<ImportProfile> {
    match path {
        Some(p) => read_profile(p),
        None => match get_default_profile_path() {
            Some(p) if p.is_file() => read_profile(&p),
            _ => {
                debug!("No profile file found, using built-in defaults");
                Ok(ImportProfile::default())
            }
        },
    }
}

fn read_profile(path: &Path) -> Result<ImportProfile> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound(path.to_path_buf()).into());
    }

    let content =
        std::fs::read_to_string(path).context(format!("Failed to read profile {:?}", path))?;
    let profile = ImportProfile::from_toml_str(&content)
        .context(format!("Invalid import profile {:?}", path))?;

    info!("Loaded import profile from {:?}", path);
    Ok(profile)
}
