//! Configuration Management
//!
//! This module loads and saves the scanner settings used by the CLI and MCP
//! surfaces. The library functions take options explicitly and never read files.
//!
//! # Configuration Locations
//! - Local: `.namedsql/config.json` (team-shareable, per-project)
//! - Global: `~/.config/namedsql/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Explicit command-line flags (highest priority)
//! 2. Local config file (`.namedsql/config.json`)
//! 3. Global config file (`~/.config/namedsql/config.json`)
//! 4. Built-in defaults
//!
//! Files hold a partial document; every field is optional and merged field by field.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::bind::{bind_template, BoundQuery, ParameterSource};
use crate::error::{NamedSqlError, Result};
use crate::rewrite::{rewrite_with, RewriteOptions, RewrittenQuery};

/// Effective settings after merging all configuration sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Scanner options passed to the rewriter
    #[serde(flatten)]
    pub rewrite: RewriteOptions,

    /// Reject templates longer than this many bytes (no limit if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_template_bytes: Option<usize>,
}

impl Settings {
    /// Apply a settings file on top of these settings
    #[must_use]
    pub fn merged_with(mut self, file: &SettingsFile) -> Self {
        if let Some(skip_comments) = file.skip_comments {
            self.rewrite.skip_comments = skip_comments;
        }
        if let Some(backslash_escapes) = file.backslash_escapes {
            self.rewrite.backslash_escapes = backslash_escapes;
        }
        if file.max_template_bytes.is_some() {
            self.max_template_bytes = file.max_template_bytes;
        }
        self
    }

    /// Enforce the template size limit
    ///
    /// The rewriter itself accepts any input; callers that take templates from
    /// outside the process check them here first.
    pub fn check_template(&self, template: &str) -> Result<()> {
        match self.max_template_bytes {
            Some(limit) if template.len() > limit => {
                Err(NamedSqlError::TemplateTooLarge { len: template.len(), limit })
            }
            _ => Ok(()),
        }
    }

    /// Check the size limit, then rewrite with these options
    pub fn rewrite(&self, template: &str) -> Result<RewrittenQuery> {
        self.check_template(template)?;
        Ok(rewrite_with(template, &self.rewrite))
    }

    /// Check the size limit, then rewrite and bind against `source`
    pub fn bind<S>(&self, template: &str, source: &S) -> Result<BoundQuery>
    where
        S: ParameterSource + ?Sized,
    {
        self.check_template(template)?;
        bind_template(template, &self.rewrite, source)
    }
}

/// On-disk settings document
///
/// Example:
/// ```json
/// {
///   "skip_comments": true,
///   "max_template_bytes": 65536
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_comments: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backslash_escapes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_template_bytes: Option<usize>,
}

impl From<Settings> for SettingsFile {
    fn from(settings: Settings) -> Self {
        Self {
            skip_comments: Some(settings.rewrite.skip_comments),
            backslash_escapes: Some(settings.rewrite.backslash_escapes),
            max_template_bytes: settings.max_template_bytes,
        }
    }
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Local config: `.namedsql/config.json` (team-shareable)
    Local,
    /// Global config: `~/.config/namedsql/config.json` (per-user)
    Global,
}

impl ConfigLocation {
    /// Path of the config file for this location
    pub fn path(self) -> Result<PathBuf> {
        match self {
            Self::Local => local_config_path(),
            Self::Global => global_config_path(),
        }
    }
}

/// Get path to local config file (`.namedsql/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        NamedSqlError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".namedsql").join("config.json"))
}

/// Get path to global config file (`~/.config/namedsql/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| NamedSqlError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("namedsql").join("config.json"))
}

/// Load a settings file
///
/// A missing file is an empty document.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| NamedSqlError::config_error(format!("Could not read config file: {e}")))?;

    if contents.trim().is_empty() {
        warn!(path = %path.display(), "config file is empty, ignoring");
        return Ok(SettingsFile::default());
    }

    serde_json::from_str(&contents)
        .map_err(|e| NamedSqlError::config_error(format!("Invalid config file format: {e}")))
}

/// Save a settings file, creating its directory if needed
pub fn save_settings_file(path: &Path, file: &SettingsFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            NamedSqlError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(file)
        .map_err(|e| NamedSqlError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| NamedSqlError::config_error(format!("Could not write config file: {e}")))
}

/// Save settings to the given location and return the path written
pub fn save_settings(location: ConfigLocation, file: &SettingsFile) -> Result<PathBuf> {
    let path = location.path()?;
    save_settings_file(&path, file)?;
    Ok(path)
}

/// Merge settings from explicit paths, lowest precedence first
pub fn load_settings_from(global: &Path, local: &Path) -> Result<Settings> {
    let global_file = load_settings_file(global)?;
    let local_file = load_settings_file(local)?;

    let settings = Settings::default().merged_with(&global_file).merged_with(&local_file);
    debug!(?settings, "resolved settings");

    Ok(settings)
}

/// Load effective settings with precedence (local over global over defaults)
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&global_config_path()?, &local_config_path()?)
}
