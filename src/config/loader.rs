//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading company
//! payroll configuration and statutory tables from YAML files.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{CompanyPolicy, PayrollConfig, StatutoryTableSet};

/// Loads and provides access to payroll configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and provides access to the company policy and the effective-dated
/// statutory table sets.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/ph2025/
/// ├── company.yaml         # Company identity and attendance policy
/// └── tables/
///     └── 2025-01-01.yaml  # Statutory tables effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/ph2025").unwrap();
///
/// let cutoff_end = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// let tables = loader.config().tables_for(cutoff_end).unwrap();
/// println!("Night diff rate: {}", tables.night_diff_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/ph2025")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Any required field is missing from the configuration
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        // Load company.yaml
        let company_path = path.join("company.yaml");
        let company = Self::load_yaml::<CompanyPolicy>(&company_path)?;

        // Load all table sets from the tables directory
        let tables_dir = path.join("tables");
        let tables = Self::load_tables(&tables_dir)?;

        let config = PayrollConfig::new(company, tables);

        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all statutory table files from the tables directory.
    fn load_tables(tables_dir: &Path) -> EngineResult<Vec<StatutoryTableSet>> {
        let tables_dir_str = tables_dir.display().to_string();

        if !tables_dir.exists() {
            return Err(EngineError::ConfigNotFound {
                path: tables_dir_str,
            });
        }

        let entries = fs::read_dir(tables_dir).map_err(|_| EngineError::ConfigNotFound {
            path: tables_dir_str.clone(),
        })?;

        let mut tables = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: tables_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let table_set = Self::load_yaml::<StatutoryTableSet>(&path)?;
                tables.push(table_set);
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no table files found)", tables_dir_str),
            });
        }

        Ok(tables)
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// The most recent statutory table set effective on or before `date`.
    pub fn tables_for(&self, date: NaiveDate) -> Option<&StatutoryTableSet> {
        self.config.tables_for(date)
    }
}
