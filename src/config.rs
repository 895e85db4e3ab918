//! TOML configuration.
//!
//! Looked up at `--config`, else `<config dir>/tasklist/config.toml` when it
//! exists; missing files and missing keys fall back to defaults.
//!
//! ```toml
//! data_dir = "~/notes/tasks"
//! categories = ["personal", "work", "study"]
//! default_filter = "pending"
//! delete_delay_ms = 300
//! due_soon_hours = 48
//! dark_mode = false
//! on_corrupt = "backup"   # or "fail"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use tracing::{debug, info};

use crate::controller::{Settings, DELETE_DELAY};
use crate::due::DUE_SOON_HOURS;
use crate::fields::{Filter, Theme};
use crate::storage::LoadPolicy;

const APP_DIR: &str = "tasklist";
/// One year.
const MAX_DUE_SOON_HOURS: i64 = 24 * 366;
const MAX_DELETE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub categories: Vec<String>,
    pub default_category: Option<String>,
    pub default_filter: Filter,
    pub delete_delay_ms: u64,
    pub due_soon_hours: i64,
    pub dark_mode: bool,
    pub on_corrupt: LoadPolicy,
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            categories: Settings::default().categories,
            default_category: None,
            default_filter: Filter::All,
            delete_delay_ms: DELETE_DELAY.as_millis() as u64,
            due_soon_hours: DUE_SOON_HOURS,
            dark_mode: false,
            on_corrupt: LoadPolicy::Backup,
            loaded_from: None,
        }
    }
}

impl Config {
    #[tracing::instrument(skip(override_path))]
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };
        let Some(path) = path else {
            debug!("no config file; using defaults");
            return Ok(Config::default());
        };

        let text = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg = Config::parse(&text).with_context(|| format!("invalid config {}", path.display()))?;
        info!(config = %path.display(), "loaded config");
        cfg.loaded_from = Some(path);
        Ok(cfg)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.categories.iter().any(|c| c.trim().is_empty()) {
            bail!("categories cannot contain blank names");
        }
        if let Some(default) = &self.default_category {
            if !self.categories.is_empty() && !self.categories.contains(default) {
                bail!("default_category '{default}' is not one of the categories");
            }
        }
        if self.due_soon_hours <= 0 || self.due_soon_hours > MAX_DUE_SOON_HOURS {
            bail!("due_soon_hours must be between 1 and {MAX_DUE_SOON_HOURS}");
        }
        if self.delete_delay_ms > MAX_DELETE_DELAY_MS {
            bail!("delete_delay_ms must be at most {MAX_DELETE_DELAY_MS}");
        }
        Ok(())
    }

    /// Category list with the default category moved to the front.
    pub fn ordered_categories(&self) -> Vec<String> {
        let mut categories = self.categories.clone();
        if let Some(default) = &self.default_category {
            if let Some(idx) = categories.iter().position(|c| c == default) {
                let c = categories.remove(idx);
                categories.insert(0, c);
            }
        }
        categories
    }

    pub fn settings(&self) -> Settings {
        Settings {
            categories: self.ordered_categories(),
            default_filter: self.default_filter,
            delete_delay: Duration::from_millis(self.delete_delay_ms.min(MAX_DELETE_DELAY_MS)),
            due_soon_window: chrono::Duration::try_hours(self.due_soon_hours.clamp(1, MAX_DUE_SOON_HOURS))
                .unwrap_or_else(|| chrono::Duration::hours(DUE_SOON_HOURS)),
            load_policy: self.on_corrupt,
        }
    }

    pub fn theme(&self) -> Theme {
        if self.dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Pick the data directory: explicit override, then config, then the
/// platform data dir.
#[tracing::instrument(skip(cfg, override_dir))]
pub fn resolve_data_dir(cfg: &Config, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Some(path) = &cfg.data_dir {
        expand_tilde(path)
    } else {
        dirs::data_dir()
            .ok_or_else(|| anyhow!("cannot determine data directory; pass --data-dir"))?
            .join(APP_DIR)
    };
    debug!(dir = %dir.display(), "resolved data directory");
    Ok(dir)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
