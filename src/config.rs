//! Configuration loaded from `codeatlas.toml`
//!
//! Every field has a default, so a missing file or a partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name looked up at the repository root
pub const CONFIG_FILE: &str = "codeatlas.toml";

/// Directory holding the database and sync output
pub const DATA_DIR: &str = ".codeatlas";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

impl Config {
    /// Load `codeatlas.toml` from `root`, falling back to defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Database location, relative paths resolved against `root`
    pub fn database_path(&self, root: &Path) -> PathBuf {
        match &self.database.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => root.join(DATA_DIR).join("index.db"),
        }
    }

    /// Export directory, relative paths resolved against `root`
    pub fn export_dir(&self, root: &Path) -> PathBuf {
        match &self.sync.export_dir {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => root.join(DATA_DIR).join("sync"),
        }
    }
}

/// Configuration for indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// File extensions to include (empty = all supported)
    pub extensions: Vec<String>,
    /// Directories to exclude
    pub exclude_dirs: Vec<String>,
    /// Whether to follow gitignore rules
    pub respect_gitignore: bool,
    /// Files larger than this many bytes are skipped
    pub max_file_size: u64,
    /// Depth bound for cycle detection
    pub cycle_depth: usize,
    /// Worker threads for parsing (None = one per core)
    pub parallel_workers: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            exclude_dirs: vec![
                "node_modules".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "coverage".to_string(),
                ".git".to_string(),
                ".next".to_string(),
                ".codeatlas".to_string(),
                "vendor".to_string(),
            ],
            respect_gitignore: true,
            max_file_size: 1024 * 1024,
            cycle_depth: 5,
            parallel_workers: None,
        }
    }
}

/// Configuration for the SQLite store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    /// Reader connections (None = available parallelism)
    pub read_pool_size: Option<usize>,
}

impl DatabaseConfig {
    pub fn effective_pool_size(&self) -> usize {
        self.read_pool_size
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
            .clamp(1, 16)
    }
}

/// Configuration for export/import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub export_dir: Option<PathBuf>,
}
