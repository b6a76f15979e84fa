//! Deletion manifest
//!
//! Natural keys of rows removed locally since the last export. Each line of
//! `deletions.jsonl` is one key tagged with its table.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sync::ImportRecordError;

pub const MANIFEST_FILE: &str = "deletions.jsonl";

/// Natural key of a deleted row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum Deletion {
    Repository {
        full_name: String,
    },
    File {
        repository: String,
        path: String,
    },
    Symbol {
        repository: String,
        file_path: String,
        name: String,
        line_start: u32,
    },
    Reference {
        repository: String,
        file_path: String,
        line: u32,
        column: u32,
        kind: String,
        name: String,
    },
    DependencyEdge {
        repository: String,
        edge_key: String,
    },
    Project {
        name: String,
    },
    ProjectRepository {
        project: String,
        repository: String,
    },
}

impl Deletion {
    /// Exported table the key belongs to
    pub fn table(&self) -> &'static str {
        match self {
            Deletion::Repository { .. } => "repositories",
            Deletion::File { .. } => "files",
            Deletion::Symbol { .. } => "symbols",
            Deletion::Reference { .. } => "references",
            Deletion::DependencyEdge { .. } => "dependency_edges",
            Deletion::Project { .. } => "projects",
            Deletion::ProjectRepository { .. } => "project_repositories",
        }
    }

    /// Queue the key in `sync_deletions`
    pub fn record(&self, conn: &Connection, deleted_at: i64) -> Result<()> {
        conn.execute(
            "INSERT INTO sync_deletions (table_name, natural_key, deleted_at) VALUES (?1, ?2, ?3)",
            params![self.table(), serde_json::to_string(self)?, deleted_at],
        )?;
        Ok(())
    }

    /// Delete the row this key names; returns rows removed
    pub fn apply(&self, conn: &Connection) -> Result<usize> {
        let removed = match self {
            Deletion::Repository { full_name } => conn.execute(
                "DELETE FROM repositories WHERE full_name = ?1",
                params![full_name],
            )?,
            Deletion::File { repository, path } => conn.execute(
                r#"
                DELETE FROM files
                WHERE path = ?2
                  AND repository_id = (SELECT id FROM repositories WHERE full_name = ?1)
                "#,
                params![repository, path],
            )?,
            Deletion::Symbol {
                repository,
                file_path,
                name,
                line_start,
            } => conn.execute(
                r#"
                DELETE FROM symbols
                WHERE name = ?3 AND line_start = ?4
                  AND file_id = (
                      SELECT f.id FROM files f
                      JOIN repositories r ON r.id = f.repository_id
                      WHERE r.full_name = ?1 AND f.path = ?2
                  )
                "#,
                params![repository, file_path, name, line_start],
            )?,
            Deletion::Reference {
                repository,
                file_path,
                line,
                column,
                kind,
                name,
            } => conn.execute(
                r#"
                DELETE FROM symbol_references
                WHERE line = ?3 AND column_number = ?4 AND reference_type = ?5 AND symbol_name = ?6
                  AND file_id = (
                      SELECT f.id FROM files f
                      JOIN repositories r ON r.id = f.repository_id
                      WHERE r.full_name = ?1 AND f.path = ?2
                  )
                "#,
                params![repository, file_path, line, column, kind, name],
            )?,
            Deletion::DependencyEdge {
                repository,
                edge_key,
            } => conn.execute(
                r#"
                DELETE FROM dependency_edges
                WHERE edge_key = ?2
                  AND repository_id = (SELECT id FROM repositories WHERE full_name = ?1)
                "#,
                params![repository, edge_key],
            )?,
            Deletion::Project { name } => {
                conn.execute("DELETE FROM projects WHERE name = ?1", params![name])?
            }
            Deletion::ProjectRepository {
                project,
                repository,
            } => conn.execute(
                r#"
                DELETE FROM project_repositories
                WHERE project_id = (SELECT id FROM projects WHERE name = ?1)
                  AND repository_id = (SELECT id FROM repositories WHERE full_name = ?2)
                "#,
                params![project, repository],
            )?,
        };
        Ok(removed)
    }
}

/// Pending keys from `sync_deletions` in the order they were recorded, with
/// the highest queue id seen
pub fn pending_deletions(conn: &Connection) -> Result<(Vec<Deletion>, Option<i64>)> {
    let mut stmt = conn.prepare("SELECT id, natural_key FROM sync_deletions ORDER BY id")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut deletions = Vec::new();
    let mut max_id = None;
    for row in rows {
        let (id, key) = row?;
        deletions.push(serde_json::from_str(&key)?);
        max_id = Some(id);
    }
    Ok((deletions, max_id))
}

/// Read a manifest; missing files are empty, malformed lines are reported
pub fn read_manifest(dir: &Path) -> Result<(Vec<Deletion>, Vec<ImportRecordError>)> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok((Vec::new(), Vec::new()));
    }
    let text = fs::read_to_string(&path)?;

    let mut deletions = Vec::new();
    let mut errors = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Deletion>(line) {
            Ok(deletion) => deletions.push(deletion),
            Err(err) => errors.push(ImportRecordError {
                table: "deletions".to_string(),
                line: idx + 1,
                message: err.to_string(),
            }),
        }
    }
    Ok((deletions, errors))
}

/// Merge previously exported and newly pending keys, dropping keys that are
/// live again and duplicates
pub fn merge_manifest(
    previous: Vec<Deletion>,
    pending: Vec<Deletion>,
    live: &HashSet<Deletion>,
) -> Vec<Deletion> {
    let mut seen = HashSet::new();
    previous
        .into_iter()
        .chain(pending)
        .filter(|d| !live.contains(d) && seen.insert(d.clone()))
        .collect()
}

/// Serialize keys one per line
pub fn render_manifest(deletions: &[Deletion]) -> Result<String> {
    let mut out = String::new();
    for deletion in deletions {
        out.push_str(&serde_json::to_string(deletion)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_key(path: &str) -> Deletion {
        Deletion::File {
            repository: "acme/web".to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_deletion_serialization() {
        let json = serde_json::to_string(&file_key("src/a.ts")).unwrap();
        assert_eq!(json, r#"{"table":"file","repository":"acme/web","path":"src/a.ts"}"#);
        let parsed: Deletion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, file_key("src/a.ts"));
        assert_eq!(parsed.table(), "files");
    }

    #[test]
    fn test_merge_drops_live_and_duplicates() {
        let previous = vec![file_key("a.ts"), file_key("b.ts")];
        let pending = vec![file_key("b.ts"), file_key("c.ts")];
        let live: HashSet<Deletion> = [file_key("a.ts")].into_iter().collect();

        let merged = merge_manifest(previous, pending, &live);
        assert_eq!(merged, vec![file_key("b.ts"), file_key("c.ts")]);
    }

    #[test]
    fn test_read_manifest_reports_bad_lines() {
        let dir = TempDir::new().unwrap();
        let text = format!(
            "{}\nnot json\n\n{}\n",
            serde_json::to_string(&file_key("a.ts")).unwrap(),
            r#"{"table":"project","name":"core"}"#
        );
        fs::write(dir.path().join(MANIFEST_FILE), text).unwrap();

        let (deletions, errors) = read_manifest(dir.path()).unwrap();
        assert_eq!(deletions.len(), 2);
        assert_eq!(deletions[1], Deletion::Project { name: "core".to_string() });
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn test_read_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let (deletions, errors) = read_manifest(dir.path()).unwrap();
        assert!(deletions.is_empty());
        assert!(errors.is_empty());
    }
}
