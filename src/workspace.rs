//! Collaborators the indexing pipeline consumes from its environment
//!
//! - `SourceLister`: yields candidate source files under a root, honouring ignore rules
//! - `Clock`: supplies timestamps (epoch seconds)

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::extraction::is_supported_extension;

/// A candidate source file found under a repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub absolute: PathBuf,
    /// Root-relative, `/`-separated
    pub relative: String,
    pub size: u64,
}

/// Lists candidate source files under a root
pub trait SourceLister: Send + Sync {
    fn list(&self, root: &Path) -> Vec<SourceEntry>;
}

/// Supplies the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time in seconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Directory walker built on the `ignore` crate
#[derive(Debug, Clone)]
pub struct WalkSourceLister {
    config: IndexConfig,
}

impl WalkSourceLister {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    fn accepts_extension(&self, ext: &str) -> bool {
        if !is_supported_extension(ext) {
            return false;
        }
        self.config.extensions.is_empty() || self.config.extensions.iter().any(|e| e == ext)
    }

    fn is_excluded(&self, relative: &str) -> bool {
        relative
            .split('/')
            .any(|segment| self.config.exclude_dirs.iter().any(|d| d == segment))
    }
}

impl SourceLister for WalkSourceLister {
    fn list(&self, root: &Path) -> Vec<SourceEntry> {
        let mut walker = WalkBuilder::new(root);
        walker
            .hidden(false)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .require_git(false);

        let mut entries = Vec::new();
        for entry in walker.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!("Error walking directory: {}", err);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !self.accepts_extension(ext) {
                continue;
            }

            let Some(relative) = relative_path(root, path) else {
                continue;
            };
            if self.is_excluded(&relative) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > self.config.max_file_size {
                debug!("Skipping {} ({} bytes exceeds limit)", relative, size);
                continue;
            }

            entries.push(SourceEntry {
                absolute: path.to_path_buf(),
                relative,
                size,
            });
        }

        entries.sort_by(|a, b| a.relative.cmp(&b.relative));
        entries
    }
}

/// Root-relative path with `/` separators
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_lists_supported_files_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.ts", "export const b = 1;");
        write(dir.path(), "src/a.js", "export const a = 1;");
        write(dir.path(), "README.md", "# readme");
        write(dir.path(), "src/style.css", "body {}");

        let lister = WalkSourceLister::new(IndexConfig::default());
        let entries = lister.list(dir.path());
        let paths: Vec<_> = entries.iter().map(|e| e.relative.as_str()).collect();
        assert_eq!(paths, vec!["src/a.js", "src/b.ts"]);
    }

    #[test]
    fn test_excludes_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/pkg/index.js", "module.exports = 1;");
        write(dir.path(), "dist/out.js", "var x = 1;");
        write(dir.path(), "src/index.ts", "export {};");

        let lister = WalkSourceLister::new(IndexConfig::default());
        let entries = lister.list(dir.path());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].relative, "src/index.ts");
    }

    #[test]
    fn test_extension_filter_and_size_limit() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.ts", "export const a = 1;");
        write(dir.path(), "b.js", "export const b = 1;");
        write(dir.path(), "big.ts", &"x".repeat(64));

        let config = IndexConfig {
            extensions: vec!["ts".to_string()],
            max_file_size: 32,
            ..Default::default()
        };
        let entries = WalkSourceLister::new(config).list(dir.path());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].relative, "a.ts");
    }

    #[test]
    fn test_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "generated/\n");
        write(dir.path(), "generated/api.ts", "export {};");
        write(dir.path(), "src/main.ts", "export {};");

        let entries = WalkSourceLister::new(IndexConfig::default()).list(dir.path());
        let paths: Vec<_> = entries.iter().map(|e| e.relative.as_str()).collect();
        assert_eq!(paths, vec!["src/main.ts"]);
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(root, Path::new("/repo/src/a.ts")),
            Some("src/a.ts".to_string())
        );
        assert_eq!(relative_path(root, Path::new("/other/a.ts")), None);
        assert_eq!(relative_path(root, Path::new("/repo")), None);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(42).now(), 42);
        assert!(SystemClock.now() > 1_600_000_000);
    }
}
