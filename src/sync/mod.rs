//! Export and import of the index as JSON lines
//!
//! Each table is written to `<table>.jsonl`, one record per line, ordered
//! by natural key so exports diff cleanly under version control. A table
//! whose content hash matches the file already on disk is left alone.
//! `deletions.jsonl` lists natural keys removed since they were exported.
//!
//! Import applies the deletion manifest and then upserts every table in
//! foreign-key order, all inside one transaction.

mod manifest;
mod records;

pub use manifest::{Deletion, MANIFEST_FILE};
pub use records::{
    EdgeRecord, FileRecord, ProjectRecord, ProjectRepositoryRecord, ReferenceRecord, RepositoryRecord,
    SymbolRecord, SyncRecord, Upsert,
};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::error::{Error, Result};
use crate::types::content_hash;

/// Exported tables in foreign-key order
pub const TABLES: [&str; 7] = [
    RepositoryRecord::TABLE,
    FileRecord::TABLE,
    SymbolRecord::TABLE,
    ReferenceRecord::TABLE,
    EdgeRecord::TABLE,
    ProjectRecord::TABLE,
    ProjectRepositoryRecord::TABLE,
];

pub fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}.jsonl", table))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportResult {
    pub tables_exported: Vec<String>,
    /// Tables whose content hash matched the existing file
    pub tables_skipped: Vec<String>,
    /// Rows written across exported tables
    pub total_rows: u64,
    /// Entries in the written deletion manifest
    pub deletions: u64,
    pub duration: Duration,
}

/// A record that could not be applied during import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecordError {
    pub table: String,
    /// 1-based line in the table file
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub tables_imported: Vec<String>,
    pub rows_imported: u64,
    pub rows_deleted: u64,
    pub errors: Vec<ImportRecordError>,
    pub duration: Duration,
}

/// One serialized table
struct TableDump {
    table: &'static str,
    body: String,
    rows: u64,
}

fn dump<R: SyncRecord>(conn: &Connection, live: &mut HashSet<Deletion>) -> Result<TableDump> {
    let records = R::load_all(conn)?;
    let mut body = String::new();
    for record in &records {
        live.insert(record.deletion_key());
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(TableDump {
        table: R::TABLE,
        body,
        rows: records.len() as u64,
    })
}

/// Everything read from the store for one export, from a single snapshot
struct Snapshot {
    tables: Vec<TableDump>,
    live: HashSet<Deletion>,
    pending: Vec<Deletion>,
    last_pending_id: Option<i64>,
}

impl Snapshot {
    fn load(conn: &Connection) -> Result<Self> {
        let tx = conn.unchecked_transaction()?;
        let mut live = HashSet::new();
        let tables = vec![
            dump::<RepositoryRecord>(&tx, &mut live)?,
            dump::<FileRecord>(&tx, &mut live)?,
            dump::<SymbolRecord>(&tx, &mut live)?,
            dump::<ReferenceRecord>(&tx, &mut live)?,
            dump::<EdgeRecord>(&tx, &mut live)?,
            dump::<ProjectRecord>(&tx, &mut live)?,
            dump::<ProjectRepositoryRecord>(&tx, &mut live)?,
        ];
        let (pending, last_pending_id) = manifest::pending_deletions(&tx)?;
        tx.commit()?;
        Ok(Self {
            tables,
            live,
            pending,
            last_pending_id,
        })
    }
}

/// Write `body` to `path` unless the file already holds the same content hash
fn write_if_changed(path: &Path, body: &str, force: bool) -> Result<bool> {
    if !force {
        if let Ok(existing) = fs::read_to_string(path) {
            if content_hash(&existing) == content_hash(body) {
                return Ok(false);
            }
        }
    }
    fs::write(path, body)?;
    Ok(true)
}

/// Export every table to `dir`
pub fn export(store: &Store, dir: &Path, force: bool) -> Result<ExportResult> {
    let started = Instant::now();
    fs::create_dir_all(dir)?;

    let snapshot = store.read(Snapshot::load)?;
    let mut result = ExportResult::default();

    for table in &snapshot.tables {
        if write_if_changed(&table_path(dir, table.table), &table.body, force)? {
            debug!("Exported {} rows from {}", table.rows, table.table);
            result.tables_exported.push(table.table.to_string());
            result.total_rows += table.rows;
        } else {
            result.tables_skipped.push(table.table.to_string());
        }
    }

    let (previous, unreadable) = manifest::read_manifest(dir)?;
    if !unreadable.is_empty() {
        warn!("Dropping {} unreadable lines from {}", unreadable.len(), MANIFEST_FILE);
    }
    let deletions = manifest::merge_manifest(previous, snapshot.pending, &snapshot.live);
    write_if_changed(&dir.join(MANIFEST_FILE), &manifest::render_manifest(&deletions)?, force)?;
    result.deletions = deletions.len() as u64;

    if let Some(last_id) = snapshot.last_pending_id {
        store.write(|conn| {
            conn.execute("DELETE FROM sync_deletions WHERE id <= ?1", params![last_id])?;
            Ok(())
        })?;
    }

    result.duration = started.elapsed();
    info!(
        "Export complete: {} tables written, {} unchanged, {} rows, {} deletions",
        result.tables_exported.len(),
        result.tables_skipped.len(),
        result.total_rows,
        result.deletions
    );
    Ok(result)
}

fn import_table<R: SyncRecord>(conn: &Connection, dir: &Path, result: &mut ImportResult) -> Result<()> {
    let path = table_path(dir, R::TABLE);
    if !path.exists() {
        return Ok(());
    }
    let text = fs::read_to_string(&path)?;

    let mut imported = 0;
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let outcome = match serde_json::from_str::<R>(line) {
            Ok(record) => record.upsert(conn)?,
            Err(err) => Upsert::Rejected(err.to_string()),
        };
        match outcome {
            Upsert::Applied => imported += 1,
            Upsert::Rejected(message) => result.errors.push(ImportRecordError {
                table: R::TABLE.to_string(),
                line: idx + 1,
                message,
            }),
        }
    }

    debug!("Imported {} rows into {}", imported, R::TABLE);
    result.rows_imported += imported;
    result.tables_imported.push(R::TABLE.to_string());
    Ok(())
}

/// Import an export directory; any storage failure rolls back everything
pub fn import(store: &Store, dir: &Path) -> Result<ImportResult> {
    let started = Instant::now();
    if !dir.is_dir() {
        return Err(Error::InvalidArgument(format!("{} is not a directory", dir.display())));
    }

    let (deletions, manifest_errors) = manifest::read_manifest(dir)?;
    let mut result = ImportResult {
        errors: manifest_errors,
        ..Default::default()
    };

    store.write(|conn| {
        let tx = conn.transaction()?;
        for deletion in &deletions {
            result.rows_deleted += deletion.apply(&tx)? as u64;
        }
        import_table::<RepositoryRecord>(&tx, dir, &mut result)?;
        import_table::<FileRecord>(&tx, dir, &mut result)?;
        import_table::<SymbolRecord>(&tx, dir, &mut result)?;
        import_table::<ReferenceRecord>(&tx, dir, &mut result)?;
        import_table::<EdgeRecord>(&tx, dir, &mut result)?;
        import_table::<ProjectRecord>(&tx, dir, &mut result)?;
        import_table::<ProjectRepositoryRecord>(&tx, dir, &mut result)?;
        tx.commit()?;
        Ok(())
    })?;

    if !result.errors.is_empty() {
        warn!("Import skipped {} records", result.errors.len());
    }
    result.duration = started.elapsed();
    info!(
        "Import complete: {} tables, {} rows, {} deleted",
        result.tables_imported.len(),
        result.rows_imported,
        result.rows_deleted
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DependencyEdge, RepositoryDescriptor, SourceFile};
    use tempfile::TempDir;

    fn populated() -> Store {
        let store = Store::in_memory().unwrap();
        let repo = store
            .upsert_repository(&RepositoryDescriptor::new("acme/web", "/tmp/web"))
            .unwrap();
        let files = vec![
            SourceFile::new("a.ts", "import { b } from './b';\n", 1),
            SourceFile::new("b.ts", "export const b = 1;\n", 1),
        ];
        let edges = vec![DependencyEdge::file_import(&repo.id, "a.ts", "b.ts")];
        store.store(&repo.id, &files, &[], &[], &edges).unwrap();
        store.create_project("platform", None).unwrap();
        store.add_repository_to_project("platform", "acme/web").unwrap();
        store
    }

    #[test]
    fn test_export_writes_every_table() {
        let store = populated();
        let dir = TempDir::new().unwrap();
        let result = export(&store, dir.path(), false).unwrap();

        assert_eq!(result.tables_exported.len(), TABLES.len());
        for table in TABLES {
            assert!(table_path(dir.path(), table).exists(), "missing {}", table);
        }
        assert!(dir.path().join(MANIFEST_FILE).exists());
        // 1 repository, 2 files, 1 edge, 1 project, 1 membership
        assert_eq!(result.total_rows, 6);
    }

    #[test]
    fn test_unchanged_tables_skipped() {
        let store = populated();
        let dir = TempDir::new().unwrap();
        export(&store, dir.path(), false).unwrap();

        let second = export(&store, dir.path(), false).unwrap();
        assert!(second.tables_exported.is_empty());
        assert_eq!(second.tables_skipped.len(), TABLES.len());

        let forced = export(&store, dir.path(), true).unwrap();
        assert_eq!(forced.tables_exported.len(), TABLES.len());
    }

    #[test]
    fn test_round_trip() {
        let store = populated();
        let dir = TempDir::new().unwrap();
        export(&store, dir.path(), false).unwrap();

        let fresh = Store::in_memory().unwrap();
        let result = import(&fresh, dir.path()).unwrap();
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.rows_imported, 6);

        let edges = fresh.load_edges("acme/web").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_file.as_deref(), Some("a.ts"));
        assert_eq!(fresh.list_projects().unwrap()[0].repositories, vec!["acme/web"]);
        assert_eq!(fresh.search("export", None, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_import_is_idempotent() {
        let store = populated();
        let dir = TempDir::new().unwrap();
        export(&store, dir.path(), false).unwrap();

        let fresh = Store::in_memory().unwrap();
        import(&fresh, dir.path()).unwrap();
        import(&fresh, dir.path()).unwrap();
        let stats = fresh.stats().unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_edges, 1);
    }

    #[test]
    fn test_malformed_rows_are_reported_and_skipped() {
        let store = populated();
        let dir = TempDir::new().unwrap();
        export(&store, dir.path(), false).unwrap();

        let path = table_path(dir.path(), FileRecord::TABLE);
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("{\"repository\": \"acme/web\"}\n");
        text.push_str("{\"repository\":\"ghost/repo\",\"path\":\"x.ts\",\"language\":\"typescript\",\"size\":0,\"content_hash\":\"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\",\"indexed_at\":0,\"content\":\"\"}\n");
        fs::write(&path, text).unwrap();

        let fresh = Store::in_memory().unwrap();
        let result = import(&fresh, dir.path()).unwrap();
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().all(|e| e.table == "files"));
        assert_eq!(result.errors[0].line, 3);
        assert!(result.errors[1].message.contains("ghost/repo"));
        assert_eq!(fresh.stats().unwrap().total_files, 2);
    }

    #[test]
    fn test_deletions_propagate() {
        let store = populated();
        let dir = TempDir::new().unwrap();
        export(&store, dir.path(), false).unwrap();

        let downstream = Store::in_memory().unwrap();
        import(&downstream, dir.path()).unwrap();

        store.delete_project("platform").unwrap();
        let result = export(&store, dir.path(), false).unwrap();
        assert_eq!(result.deletions, 1);

        let applied = import(&downstream, dir.path()).unwrap();
        assert_eq!(applied.rows_deleted, 1);
        assert!(downstream.list_projects().unwrap().is_empty());

        // The queue is drained but the manifest keeps the key
        let again = export(&store, dir.path(), false).unwrap();
        assert_eq!(again.deletions, 1);
    }

    #[test]
    fn test_import_missing_dir() {
        let store = Store::in_memory().unwrap();
        let err = import(&store, Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
