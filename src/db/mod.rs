//! Storage engine for codeatlas
//!
//! Handles SQLite storage for the index including:
//! - Schema creation and the full-text index
//! - Writer connection and reader pool
//! - Transactional storage of indexing runs
//! - Search, dependency and project queries

mod pool;
mod projects;
mod queries;
mod schema;
mod writer;

pub use pool::{ConnectionPool, ReadPool, MAX_READERS};
pub use queries::MAX_QUERY_DEPTH;

use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::sync::Deletion;
use crate::types::{Language, Repository, RepositoryDescriptor, StoreStats, SymbolKind};
use crate::workspace::{Clock, SystemClock};

/// Handle to an index database
pub struct Store {
    pool: ConnectionPool,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P, read_pool_size: usize) -> Result<Self> {
        let pool = ConnectionPool::open(path.as_ref(), read_pool_size)?;
        Ok(Self {
            pool,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            pool: ConnectionPool::in_memory()?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for bookkeeping timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.pool.path()
    }

    pub(crate) fn now(&self) -> i64 {
        self.clock.now()
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.pool.with_reader(f)
    }

    pub(crate) fn write<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        self.pool.with_writer(f)
    }

    // =========================================================================
    // Repository Operations
    // =========================================================================

    /// Insert or update a repository by full name, keeping its id
    pub fn upsert_repository(&self, descriptor: &RepositoryDescriptor) -> Result<Repository> {
        let id = Uuid::new_v4().to_string();
        self.write(|conn| upsert_repository(conn, &id, descriptor))
    }

    pub fn get_repository(&self, full_name: &str) -> Result<Option<Repository>> {
        self.read(|conn| get_repository(conn, full_name))
    }

    pub fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, full_name, git_url, default_branch, last_indexed_at FROM repositories ORDER BY full_name",
            )?;
            let rows = stmt.query_map([], row_to_repository)?;

            let mut repositories = Vec::new();
            for row in rows {
                repositories.push(row?);
            }
            Ok(repositories)
        })
    }

    /// Delete a repository and everything it owns; returns false if unknown
    pub fn delete_repository(&self, full_name: &str) -> Result<bool> {
        let now = self.now();
        let deleted = self.write(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM repositories WHERE full_name = ?1",
                params![full_name],
            )?;
            if removed > 0 {
                Deletion::Repository {
                    full_name: full_name.to_string(),
                }
                .record(&tx, now)?;
            }
            tx.commit()?;
            Ok(removed > 0)
        })?;
        if deleted {
            info!("Deleted repository {}", full_name);
        }
        Ok(deleted)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub fn stats(&self) -> Result<StoreStats> {
        self.read(|conn| {
            let count = |table: &str| -> Result<u64> {
                let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
                Ok(n as u64)
            };

            let db_size_bytes: i64 = conn.query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )?;

            let mut languages = Vec::new();
            let mut stmt = conn.prepare(
                "SELECT language, COUNT(*) FROM files GROUP BY language ORDER BY COUNT(*) DESC, language",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                let (language, n) = row?;
                languages.push((Language::from_name(&language), n as u64));
            }

            let mut symbol_kinds = Vec::new();
            let mut stmt = conn.prepare(
                "SELECT kind, COUNT(*) FROM symbols GROUP BY kind ORDER BY COUNT(*) DESC, kind",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                let (kind, n) = row?;
                if let Some(kind) = SymbolKind::from_str(&kind) {
                    symbol_kinds.push((kind, n as u64));
                }
            }

            Ok(StoreStats {
                total_repositories: count("repositories")?,
                total_files: count("files")?,
                total_symbols: count("symbols")?,
                total_references: count("symbol_references")?,
                total_edges: count("dependency_edges")?,
                db_size_bytes: db_size_bytes as u64,
                languages,
                symbol_kinds,
            })
        })
    }
}

/// Upsert by full name; `id` is only used when the repository is new
pub(crate) fn upsert_repository(conn: &Connection, id: &str, descriptor: &RepositoryDescriptor) -> Result<Repository> {
    conn.execute(
        r#"
        INSERT INTO repositories (id, name, full_name, git_url, default_branch)
        VALUES (?1, ?2, ?3, ?4, COALESCE(?5, 'main'))
        ON CONFLICT(full_name) DO UPDATE SET
            name = excluded.name,
            git_url = COALESCE(excluded.git_url, repositories.git_url),
            default_branch = COALESCE(?5, repositories.default_branch)
        "#,
        params![
            id,
            descriptor.name,
            descriptor.full_name,
            descriptor.git_url,
            descriptor.default_branch,
        ],
    )?;
    get_repository(conn, &descriptor.full_name)?.ok_or_else(|| Error::RepositoryNotFound(descriptor.full_name.clone()))
}

pub(crate) fn get_repository(conn: &Connection, full_name: &str) -> Result<Option<Repository>> {
    let repository = conn
        .query_row(
            "SELECT id, name, full_name, git_url, default_branch, last_indexed_at FROM repositories WHERE full_name = ?1",
            params![full_name],
            row_to_repository,
        )
        .optional()?;
    Ok(repository)
}

pub(crate) fn repository_id(conn: &Connection, full_name: &str) -> Result<Option<String>> {
    let id = conn
        .query_row(
            "SELECT id FROM repositories WHERE full_name = ?1",
            params![full_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn row_to_repository(row: &rusqlite::Row) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        name: row.get(1)?,
        full_name: row.get(2)?,
        git_url: row.get(3)?,
        default_branch: row.get(4)?,
        last_indexed_at: row.get(5)?,
    })
}
