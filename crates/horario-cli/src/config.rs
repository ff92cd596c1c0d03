//! Application configuration (`horario.toml`).
//!
//! Lookup order: `--config` (or `HORARIO_CONFIG`), then `./horario.toml`,
//! then built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use horario_core::daily::DailyOptions;
use horario_core::{DetailLevel, ExportOptions};
use serde::Deserialize;
use tracing::{debug, info};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "horario.toml";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub export: ExportConfig,
    pub feed: FeedConfig,
}

/// `[export]` section
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub title: String,
    pub currency: String,
    /// Hour totals below this magnitude are left out of the export
    pub epsilon: f64,
    pub detail: DetailLevel,
    pub summary_sheet: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "CONTROL HORARIO".into(),
            currency: "€".into(),
            epsilon: 0.01,
            detail: DetailLevel::default(),
            summary_sheet: "Resumen".into(),
        }
    }
}

/// `[feed]` section
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub day_offset_hours: i64,
    pub max_note_depth: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let daily = DailyOptions::default();
        Self {
            day_offset_hours: daily.day_offset_hours,
            max_note_depth: daily.max_note_depth,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path, else `./horario.toml` if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !local.is_file() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                local
            }
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn export_options(&self, detail: Option<DetailLevel>) -> ExportOptions {
        ExportOptions {
            epsilon: self.export.epsilon,
            detail: detail.unwrap_or(self.export.detail),
        }
    }

    pub fn daily_options(&self) -> DailyOptions {
        DailyOptions {
            day_offset_hours: self.feed.day_offset_hours,
            max_note_depth: self.feed.max_note_depth,
        }
    }
}
