//! One record type per exported table
//!
//! Records carry their parents by natural key rather than by id, so an
//! export can be applied to a store whose ids differ.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::manifest::Deletion;
use crate::db::repository_id;
use crate::error::Result;
use crate::types::{
    content_hash, DependencyEdge, EdgeKind, Language, ReferenceKind, ReferenceMetadata, SymbolKey, SymbolKind,
};

/// Outcome of applying one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Applied,
    /// Row skipped; the message says why
    Rejected(String),
}

/// A table that takes part in export and import
pub trait SyncRecord: Serialize + DeserializeOwned {
    /// Exported table name; the file is `<TABLE>.jsonl`
    const TABLE: &'static str;

    /// Every row, ordered by natural key
    fn load_all(conn: &Connection) -> Result<Vec<Self>>;

    fn deletion_key(&self) -> Deletion;

    /// Insert or update by natural key, keeping the id of an existing row
    fn upsert(&self, conn: &Connection) -> Result<Upsert>;
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// `(repository_id, file_id)` for a file named by natural key
fn file_ids(conn: &Connection, repository: &str, path: &str) -> Result<Option<(String, String)>> {
    let ids = conn
        .query_row(
            r#"
            SELECT r.id, f.id FROM files f
            JOIN repositories r ON r.id = f.repository_id
            WHERE r.full_name = ?1 AND f.path = ?2
            "#,
            params![repository, path],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(ids)
}

fn symbol_id(conn: &Connection, repository: &str, key: &SymbolKey) -> Result<Option<String>> {
    let id = conn
        .query_row(
            r#"
            SELECT s.id FROM symbols s
            JOIN files f ON f.id = s.file_id
            JOIN repositories r ON r.id = f.repository_id
            WHERE r.full_name = ?1 AND f.path = ?2 AND s.name = ?3 AND s.line_start = ?4
            "#,
            params![repository, key.file_path, key.name, key.line_start],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn symbol_key(file_path: Option<String>, name: Option<String>, line_start: Option<u32>) -> Option<SymbolKey> {
    Some(SymbolKey {
        file_path: file_path?,
        name: name?,
        line_start: line_start?,
    })
}

// =============================================================================
// Repositories
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub full_name: String,
    pub name: String,
    #[serde(default)]
    pub git_url: Option<String>,
    pub default_branch: String,
    #[serde(default)]
    pub last_indexed_at: Option<i64>,
}

impl SyncRecord for RepositoryRecord {
    const TABLE: &'static str = "repositories";

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT full_name, name, git_url, default_branch, last_indexed_at FROM repositories ORDER BY full_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Self {
                full_name: row.get(0)?,
                name: row.get(1)?,
                git_url: row.get(2)?,
                default_branch: row.get(3)?,
                last_indexed_at: row.get(4)?,
            })
        })?;
        collect(rows)
    }

    fn deletion_key(&self) -> Deletion {
        Deletion::Repository {
            full_name: self.full_name.clone(),
        }
    }

    fn upsert(&self, conn: &Connection) -> Result<Upsert> {
        conn.execute(
            r#"
            INSERT INTO repositories (id, name, full_name, git_url, default_branch, last_indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(full_name) DO UPDATE SET
                name = excluded.name,
                git_url = excluded.git_url,
                default_branch = excluded.default_branch,
                last_indexed_at = excluded.last_indexed_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                self.name,
                self.full_name,
                self.git_url,
                self.default_branch,
                self.last_indexed_at,
            ],
        )?;
        Ok(Upsert::Applied)
    }
}

// =============================================================================
// Files
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub repository: String,
    pub path: String,
    pub language: Language,
    pub size: u64,
    pub content_hash: String,
    pub indexed_at: i64,
    pub content: String,
}

impl SyncRecord for FileRecord {
    const TABLE: &'static str = "files";

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.full_name, f.path, f.language, f.size, f.content_hash, f.indexed_at, f.content
            FROM files f JOIN repositories r ON r.id = f.repository_id
            ORDER BY r.full_name, f.path
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Self {
                repository: row.get(0)?,
                path: row.get(1)?,
                language: Language::from_name(&row.get::<_, String>(2)?),
                size: row.get::<_, i64>(3)? as u64,
                content_hash: row.get(4)?,
                indexed_at: row.get(5)?,
                content: row.get(6)?,
            })
        })?;
        collect(rows)
    }

    fn deletion_key(&self) -> Deletion {
        Deletion::File {
            repository: self.repository.clone(),
            path: self.path.clone(),
        }
    }

    fn upsert(&self, conn: &Connection) -> Result<Upsert> {
        if content_hash(&self.content) != self.content_hash {
            return Ok(Upsert::Rejected(format!("content hash mismatch for {}", self.path)));
        }
        let Some(repo_id) = repository_id(conn, &self.repository)? else {
            return Ok(Upsert::Rejected(format!("repository {} not found", self.repository)));
        };

        // Content is only rewritten when its hash changed
        conn.execute(
            r#"
            INSERT INTO files (id, repository_id, path, content, language, size, content_hash, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(repository_id, path) DO UPDATE SET
                content = excluded.content,
                content_hash = excluded.content_hash
            WHERE files.content_hash != excluded.content_hash
            "#,
            params![
                Uuid::new_v4().to_string(),
                repo_id,
                self.path,
                self.content,
                self.language.as_str(),
                self.size as i64,
                self.content_hash,
                self.indexed_at,
            ],
        )?;
        conn.execute(
            "UPDATE files SET language = ?3, size = ?4, indexed_at = ?5 WHERE repository_id = ?1 AND path = ?2",
            params![repo_id, self.path, self.language.as_str(), self.size as i64, self.indexed_at],
        )?;
        Ok(Upsert::Applied)
    }
}

// =============================================================================
// Symbols
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub repository: String,
    pub file_path: String,
    pub name: String,
    pub kind: SymbolKind,
    pub line_start: u32,
    pub line_end: u32,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub is_exported: bool,
}

impl SyncRecord for SymbolRecord {
    const TABLE: &'static str = "symbols";

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.full_name, f.path, s.name, s.kind, s.line_start, s.line_end,
                   s.signature, s.documentation, s.is_exported
            FROM symbols s
            JOIN files f ON f.id = s.file_id
            JOIN repositories r ON r.id = f.repository_id
            ORDER BY r.full_name, f.path, s.line_start, s.name
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(3)?;
            Ok(Self {
                repository: row.get(0)?,
                file_path: row.get(1)?,
                name: row.get(2)?,
                kind: SymbolKind::from_str(&kind).unwrap_or(SymbolKind::Variable),
                line_start: row.get(4)?,
                line_end: row.get(5)?,
                signature: row.get(6)?,
                documentation: row.get(7)?,
                is_exported: row.get(8)?,
            })
        })?;
        collect(rows)
    }

    fn deletion_key(&self) -> Deletion {
        Deletion::Symbol {
            repository: self.repository.clone(),
            file_path: self.file_path.clone(),
            name: self.name.clone(),
            line_start: self.line_start,
        }
    }

    fn upsert(&self, conn: &Connection) -> Result<Upsert> {
        let Some((repo_id, file_id)) = file_ids(conn, &self.repository, &self.file_path)? else {
            return Ok(Upsert::Rejected(format!("file {} not found", self.file_path)));
        };
        conn.execute(
            r#"
            INSERT INTO symbols (id, file_id, repository_id, name, kind, line_start, line_end, signature, documentation, is_exported)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(file_id, name, line_start) DO UPDATE SET
                kind = excluded.kind,
                line_end = excluded.line_end,
                signature = excluded.signature,
                documentation = excluded.documentation,
                is_exported = excluded.is_exported
            "#,
            params![
                Uuid::new_v4().to_string(),
                file_id,
                repo_id,
                self.name,
                self.kind.as_str(),
                self.line_start,
                self.line_end,
                self.signature,
                self.documentation,
                self.is_exported,
            ],
        )?;
        Ok(Upsert::Applied)
    }
}

// =============================================================================
// References
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub repository: String,
    pub file_path: String,
    pub line: u32,
    pub column: u32,
    pub kind: ReferenceKind,
    pub name: String,
    #[serde(default)]
    pub target_file_path: Option<String>,
    #[serde(default)]
    pub target_symbol: Option<SymbolKey>,
    #[serde(default)]
    pub metadata: ReferenceMetadata,
}

impl SyncRecord for ReferenceRecord {
    const TABLE: &'static str = "references";

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.full_name, f.path, sr.line, sr.column_number, sr.reference_type, sr.symbol_name,
                   sr.target_file_path, tf.path, ts.name, ts.line_start, sr.metadata
            FROM symbol_references sr
            JOIN files f ON f.id = sr.file_id
            JOIN repositories r ON r.id = f.repository_id
            LEFT JOIN symbols ts ON ts.id = sr.target_symbol_id
            LEFT JOIN files tf ON tf.id = ts.file_id
            ORDER BY r.full_name, f.path, sr.line, sr.column_number, sr.reference_type, sr.symbol_name
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(4)?;
            let metadata: String = row.get(10)?;
            Ok((
                Self {
                    repository: row.get(0)?,
                    file_path: row.get(1)?,
                    line: row.get(2)?,
                    column: row.get(3)?,
                    kind: ReferenceKind::from_str(&kind).unwrap_or(ReferenceKind::VariableReference),
                    name: row.get(5)?,
                    target_file_path: row.get(6)?,
                    target_symbol: symbol_key(row.get(7)?, row.get(8)?, row.get(9)?),
                    metadata: ReferenceMetadata::default(),
                },
                metadata,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, metadata) = row?;
            record.metadata = serde_json::from_str(&metadata)?;
            records.push(record);
        }
        Ok(records)
    }

    fn deletion_key(&self) -> Deletion {
        Deletion::Reference {
            repository: self.repository.clone(),
            file_path: self.file_path.clone(),
            line: self.line,
            column: self.column,
            kind: self.kind.as_str().to_string(),
            name: self.name.clone(),
        }
    }

    fn upsert(&self, conn: &Connection) -> Result<Upsert> {
        let Some((repo_id, file_id)) = file_ids(conn, &self.repository, &self.file_path)? else {
            return Ok(Upsert::Rejected(format!("file {} not found", self.file_path)));
        };
        let target = match &self.target_symbol {
            Some(key) => symbol_id(conn, &self.repository, key)?,
            None => None,
        };
        conn.execute(
            r#"
            INSERT INTO symbol_references (
                id, file_id, repository_id, symbol_name, target_symbol_id, target_file_path,
                line, column_number, reference_type, metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(file_id, line, column_number, reference_type, symbol_name) DO UPDATE SET
                target_symbol_id = excluded.target_symbol_id,
                target_file_path = excluded.target_file_path,
                metadata = excluded.metadata
            "#,
            params![
                Uuid::new_v4().to_string(),
                file_id,
                repo_id,
                self.name,
                target,
                self.target_file_path,
                self.line,
                self.column,
                self.kind.as_str(),
                serde_json::to_string(&self.metadata)?,
            ],
        )?;
        Ok(Upsert::Applied)
    }
}

// =============================================================================
// Dependency Edges
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub repository: String,
    pub kind: EdgeKind,
    #[serde(default)]
    pub from_file: Option<String>,
    #[serde(default)]
    pub to_file: Option<String>,
    #[serde(default)]
    pub from_symbol: Option<SymbolKey>,
    #[serde(default)]
    pub to_symbol: Option<SymbolKey>,
}

impl EdgeRecord {
    fn edge(&self) -> DependencyEdge {
        DependencyEdge {
            repository_id: String::new(),
            kind: self.kind,
            from_file: self.from_file.clone(),
            to_file: self.to_file.clone(),
            from_symbol: self.from_symbol.clone(),
            to_symbol: self.to_symbol.clone(),
        }
    }

    fn file_id(&self, conn: &Connection, path: Option<&String>) -> Result<std::result::Result<Option<String>, String>> {
        let Some(path) = path else {
            return Ok(Ok(None));
        };
        Ok(match file_ids(conn, &self.repository, path)? {
            Some((_, id)) => Ok(Some(id)),
            None => Err(format!("file {} not found", path)),
        })
    }

    fn symbol_id(&self, conn: &Connection, key: Option<&SymbolKey>) -> Result<std::result::Result<Option<String>, String>> {
        let Some(key) = key else {
            return Ok(Ok(None));
        };
        Ok(match symbol_id(conn, &self.repository, key)? {
            Some(id) => Ok(Some(id)),
            None => Err(format!("symbol {}@{} in {} not found", key.name, key.line_start, key.file_path)),
        })
    }
}

impl SyncRecord for EdgeRecord {
    const TABLE: &'static str = "dependency_edges";

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.full_name, e.edge_type, ff.path, tf.path,
                   fsf.path, fs.name, fs.line_start,
                   tsf.path, ts.name, ts.line_start
            FROM dependency_edges e
            JOIN repositories r ON r.id = e.repository_id
            LEFT JOIN files ff ON ff.id = e.from_file_id
            LEFT JOIN files tf ON tf.id = e.to_file_id
            LEFT JOIN symbols fs ON fs.id = e.from_symbol_id
            LEFT JOIN files fsf ON fsf.id = fs.file_id
            LEFT JOIN symbols ts ON ts.id = e.to_symbol_id
            LEFT JOIN files tsf ON tsf.id = ts.file_id
            ORDER BY r.full_name, e.edge_key
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(1)?;
            Ok(Self {
                repository: row.get(0)?,
                kind: EdgeKind::from_str(&kind).unwrap_or(EdgeKind::FileImport),
                from_file: row.get(2)?,
                to_file: row.get(3)?,
                from_symbol: symbol_key(row.get(4)?, row.get(5)?, row.get(6)?),
                to_symbol: symbol_key(row.get(7)?, row.get(8)?, row.get(9)?),
            })
        })?;
        collect(rows)
    }

    fn deletion_key(&self) -> Deletion {
        Deletion::DependencyEdge {
            repository: self.repository.clone(),
            edge_key: self.edge().edge_key(),
        }
    }

    fn upsert(&self, conn: &Connection) -> Result<Upsert> {
        let edge = self.edge();
        if !edge.is_well_formed() {
            return Ok(Upsert::Rejected("edge has no complete endpoint pair".to_string()));
        }
        let Some(repo_id) = repository_id(conn, &self.repository)? else {
            return Ok(Upsert::Rejected(format!("repository {} not found", self.repository)));
        };

        let ids = (
            self.file_id(conn, self.from_file.as_ref())?,
            self.file_id(conn, self.to_file.as_ref())?,
            self.symbol_id(conn, self.from_symbol.as_ref())?,
            self.symbol_id(conn, self.to_symbol.as_ref())?,
        );
        let (from_file, to_file, from_symbol, to_symbol) = match ids {
            (Ok(a), Ok(b), Ok(c), Ok(d)) => (a, b, c, d),
            (Err(message), ..) | (_, Err(message), ..) | (_, _, Err(message), _) | (.., Err(message)) => {
                return Ok(Upsert::Rejected(message));
            }
        };

        conn.execute(
            r#"
            INSERT INTO dependency_edges (
                id, repository_id, edge_key, edge_type,
                from_file_id, to_file_id, from_symbol_id, to_symbol_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(repository_id, edge_key) DO UPDATE SET
                from_file_id = excluded.from_file_id,
                to_file_id = excluded.to_file_id,
                from_symbol_id = excluded.from_symbol_id,
                to_symbol_id = excluded.to_symbol_id
            "#,
            params![
                Uuid::new_v4().to_string(),
                repo_id,
                edge.edge_key(),
                self.kind.as_str(),
                from_file,
                to_file,
                from_symbol,
                to_symbol,
            ],
        )?;
        Ok(Upsert::Applied)
    }
}

// =============================================================================
// Projects
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: i64,
}

impl SyncRecord for ProjectRecord {
    const TABLE: &'static str = "projects";

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT name, description, created_at FROM projects ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Self {
                name: row.get(0)?,
                description: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        collect(rows)
    }

    fn deletion_key(&self) -> Deletion {
        Deletion::Project {
            name: self.name.clone(),
        }
    }

    fn upsert(&self, conn: &Connection) -> Result<Upsert> {
        conn.execute(
            r#"
            INSERT INTO projects (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                created_at = excluded.created_at
            "#,
            params![Uuid::new_v4().to_string(), self.name, self.description, self.created_at],
        )?;
        Ok(Upsert::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRepositoryRecord {
    pub project: String,
    pub repository: String,
}

impl SyncRecord for ProjectRepositoryRecord {
    const TABLE: &'static str = "project_repositories";

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT p.name, r.full_name
            FROM project_repositories pr
            JOIN projects p ON p.id = pr.project_id
            JOIN repositories r ON r.id = pr.repository_id
            ORDER BY p.name, r.full_name
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Self {
                project: row.get(0)?,
                repository: row.get(1)?,
            })
        })?;
        collect(rows)
    }

    fn deletion_key(&self) -> Deletion {
        Deletion::ProjectRepository {
            project: self.project.clone(),
            repository: self.repository.clone(),
        }
    }

    fn upsert(&self, conn: &Connection) -> Result<Upsert> {
        let project_id: Option<String> = conn
            .query_row("SELECT id FROM projects WHERE name = ?1", params![self.project], |row| row.get(0))
            .optional()?;
        let Some(project_id) = project_id else {
            return Ok(Upsert::Rejected(format!("project {} not found", self.project)));
        };
        let Some(repo_id) = repository_id(conn, &self.repository)? else {
            return Ok(Upsert::Rejected(format!("repository {} not found", self.repository)));
        };
        conn.execute(
            "INSERT OR IGNORE INTO project_repositories (project_id, repository_id) VALUES (?1, ?2)",
            params![project_id, repo_id],
        )?;
        Ok(Upsert::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::types::{RepositoryDescriptor, SourceFile};

    fn store_with_file() -> Store {
        let store = Store::in_memory().unwrap();
        let repo = store
            .upsert_repository(&RepositoryDescriptor::new("acme/web", "/tmp/web"))
            .unwrap();
        let files = vec![SourceFile::new("a.ts", "export const a = 1;\n", 5)];
        store.store(&repo.id, &files, &[], &[], &[]).unwrap();
        store
    }

    #[test]
    fn test_file_record_rejects_bad_hash() {
        let store = store_with_file();
        let record = FileRecord {
            repository: "acme/web".to_string(),
            path: "b.ts".to_string(),
            language: Language::TypeScript,
            size: 3,
            content_hash: "not-a-hash".to_string(),
            indexed_at: 1,
            content: "abc".to_string(),
        };
        let outcome = store.write(|conn| record.upsert(conn)).unwrap();
        assert!(matches!(outcome, Upsert::Rejected(_)));
    }

    #[test]
    fn test_symbol_record_missing_parent() {
        let store = store_with_file();
        let record = SymbolRecord {
            repository: "acme/web".to_string(),
            file_path: "missing.ts".to_string(),
            name: "x".to_string(),
            kind: SymbolKind::Constant,
            line_start: 1,
            line_end: 1,
            signature: None,
            documentation: None,
            is_exported: false,
        };
        let outcome = store.write(|conn| record.upsert(conn)).unwrap();
        assert_eq!(outcome, Upsert::Rejected("file missing.ts not found".to_string()));
    }

    #[test]
    fn test_file_upsert_keeps_id() {
        let store = store_with_file();
        let records = store.read(|conn| FileRecord::load_all(conn)).unwrap();
        assert_eq!(records.len(), 1);

        let id = |store: &Store| -> String {
            store
                .read(|conn| Ok(conn.query_row("SELECT id FROM files", [], |row| row.get(0))?))
                .unwrap()
        };
        let before = id(&store);
        let mut changed = records[0].clone();
        changed.content = "export const a = 2;\n".to_string();
        changed.content_hash = content_hash(&changed.content);
        assert_eq!(store.write(|conn| changed.upsert(conn)).unwrap(), Upsert::Applied);
        assert_eq!(id(&store), before);

        let reloaded = store.read(|conn| FileRecord::load_all(conn)).unwrap();
        assert_eq!(reloaded[0].content, changed.content);
    }

    #[test]
    fn test_edge_record_rejects_unknown_file() {
        let store = store_with_file();
        let record = EdgeRecord {
            repository: "acme/web".to_string(),
            kind: EdgeKind::FileImport,
            from_file: Some("a.ts".to_string()),
            to_file: Some("gone.ts".to_string()),
            from_symbol: None,
            to_symbol: None,
        };
        let outcome = store.write(|conn| record.upsert(conn)).unwrap();
        assert_eq!(outcome, Upsert::Rejected("file gone.ts not found".to_string()));
    }
}
