use super::types::{Config, LogLevel};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_SEARCH_PATHS: [&str; 3] = [
    "./parley.toml",
    "~/.parley/config.toml",
    "~/.config/parley/config.toml",
];

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand(path.as_ref());
        let content = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// First existing file on the search path, or the defaults.
    pub fn load_default() -> Result<Self> {
        for path in CONFIG_SEARCH_PATHS {
            let expanded = expand(Path::new(path));
            if expanded.exists() {
                return Self::load_from_file(expanded);
            }
        }

        Ok(Config::default())
    }

    pub fn merge_env(self) -> Self {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    pub fn merge_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("PARLEY_LOG_LEVEL").and_then(|l| LogLevel::parse(&l)) {
            self.general.log_level = level;
        }

        if let Some(model) = lookup("PARLEY_MODEL").filter(|m| !m.is_empty()) {
            self.llm.default_model = model;
        }

        self
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}
