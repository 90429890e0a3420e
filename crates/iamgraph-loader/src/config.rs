//! Loader configuration

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Workbook sheet names
    pub sheets: SheetNames,
    /// Turn the first skipped item into a run failure
    pub abort_on_skip: bool,
    /// Log output format used by the binary
    pub log_format: LogFormat,
}

impl LoaderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With abort on skip
    #[inline]
    #[must_use]
    pub fn with_abort_on_skip(mut self, abort: bool) -> Self {
        self.abort_on_skip = abort;
        self
    }

    /// With log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `LoadError::Config` for invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, LoadError> {
        toml::from_str(text).map_err(|e| LoadError::Config(e.to_string()))
    }

    /// Read TOML file
    ///
    /// # Errors
    /// Returns `LoadError::Config` if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoadError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sheets: SheetNames::default(),
            abort_on_skip: false,
            log_format: LogFormat::Text,
        }
    }
}

/// Sheet names of the exported workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetNames {
    /// Policies sheet
    pub policies: String,
    /// Users sheet
    pub users: String,
    /// Groups sheet
    pub groups: String,
    /// Roles sheet
    pub roles: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            policies: "policies".into(),
            users: "users".into(),
            groups: "groups".into(),
            roles: "roles".into(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = LoaderConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.sheets.roles, "roles");
    }

    #[test]
    fn partial_toml_overrides() {
        let config = LoaderConfig::from_toml_str(
            r#"
            abort_on_skip = true
            log_format = "json"

            [sheets]
            policies = "Policies"
            "#,
        )
        .unwrap();

        assert!(config.abort_on_skip);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.sheets.policies, "Policies");
        assert_eq!(config.sheets.users, "users");
    }

    #[test]
    fn unknown_key_rejected() {
        let result = LoaderConfig::from_toml_str("abort_on_skipp = true");
        assert!(matches!(result, Err(LoadError::Config(_))));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.toml");
        std::fs::write(&path, "abort_on_skip = true\n").unwrap();

        let config = LoaderConfig::from_path(&path).unwrap();
        assert!(config.abort_on_skip);

        let missing = LoaderConfig::from_path(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(LoadError::Config(_))));
    }
}
