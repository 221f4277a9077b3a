use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub(crate) const DB_ENV: &str = "PROPLEDGER_DB";
pub(crate) const AUTO_MIGRATE_ENV: &str = "PROPLEDGER_AUTO_MIGRATE";
pub(crate) const LOG_ENV: &str = "PROPLEDGER_LOG";
pub(crate) const DEFAULT_LOG_FILTER: &str = "propledger=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    /// Apply pending schema migrations on open.
    pub(crate) auto_migrate: bool,
    pub(crate) log_filter: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match lookup(DB_ENV).filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(expand_home(path.trim())),
            None => default_db_path()?,
        };
        let auto_migrate = lookup(AUTO_MIGRATE_ENV).map_or(true, |v| parse_flag(&v));
        let log_filter = lookup(LOG_ENV)
            .or_else(|| lookup("RUST_LOG"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            db_path,
            auto_migrate,
            log_filter,
        })
    }

    /// `--db <path>` wins over the environment.
    pub(crate) fn with_db_override(mut self, path: Option<&str>) -> Self {
        if let Some(p) = path {
            self.db_path = PathBuf::from(expand_home(p));
        }
        self
    }

    /// Create the database's parent directory if needed.
    pub(crate) fn ensure_db_dir(&self) -> Result<()> {
        if let Some(dir) = self.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            create_dir(dir)?;
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "propledger", "PropLedger")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().join("propledger.db"))
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))
}

pub(crate) fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
