//! Store location and initialization utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db::Store;

/// Load the configuration for a project root
pub fn load_config(project_root: &Path) -> Result<Config> {
    Config::load(project_root).with_context(|| format!("Failed to load config from {}", project_root.display()))
}

/// Ensure the directory holding the database exists
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Open or initialize the store for a project
pub fn open_project_store(project_root: &Path, config: &Config) -> Result<Store> {
    let db_path = config.database_path(project_root);
    ensure_database_directory(&db_path)?;
    Store::open(&db_path, config.database.effective_pool_size())
        .with_context(|| format!("Failed to open index at {}", db_path.display()))
}

/// Open the store only if an index already exists
pub fn open_existing_store(project_root: &Path, config: &Config) -> Result<Option<Store>> {
    let db_path = config.database_path(project_root);
    if !db_path.exists() {
        println!("No index found at {}", db_path.display());
        println!("Run 'codeatlas index {}' first.", project_root.display());
        return Ok(None);
    }
    Ok(Some(open_project_store(project_root, config)?))
}

/// Canonicalize and validate a path
pub fn canonicalize_path(path: &str) -> Result<PathBuf> {
    Path::new(path)
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", path))
}

/// Repository name for a root when none is given: its directory name
pub fn default_full_name(project_root: &Path) -> String {
    project_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "root".to_string())
}
