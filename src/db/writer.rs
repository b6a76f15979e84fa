//! Transactional storage of one indexing run
//!
//! Everything a run produces is written inside a single transaction. Files
//! are updated in place so their ids survive a re-index; symbols, references
//! and edges of the repository are replaced wholesale. Foreign keys are
//! resolved through lookup maps built inside the transaction.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{upsert_repository, Store};
use crate::error::{Error, Result};
use crate::sync::Deletion;
use crate::types::{
    DependencyEdge, Reference, Repository, RepositoryDescriptor, SourceFile, StorageResult, Symbol, SymbolKey,
};

impl Store {
    /// Persist one run for `repository_id`; all or nothing
    pub fn store(
        &self,
        repository_id: &str,
        files: &[SourceFile],
        symbols: &[Symbol],
        references: &[Reference],
        edges: &[DependencyEdge],
    ) -> Result<StorageResult> {
        let now = self.now();
        self.write(|conn| {
            let tx = conn.transaction()?;
            let result = RunWriter::new(&tx, repository_id, now)?.write(files, symbols, references, edges)?;
            tx.commit()?;
            Ok(result)
        })
    }

    /// Upsert the repository and persist one run for it in a single
    /// transaction. A failed run leaves no trace of the repository row
    /// either. `id` is only used when the repository is new.
    pub fn store_repository(
        &self,
        descriptor: &RepositoryDescriptor,
        id: &str,
        files: &[SourceFile],
        symbols: &[Symbol],
        references: &[Reference],
        edges: &[DependencyEdge],
    ) -> Result<(Repository, StorageResult)> {
        let now = self.now();
        self.write(|conn| {
            let tx = conn.transaction()?;
            let mut repository = upsert_repository(&tx, id, descriptor)?;
            let result = RunWriter::new(&tx, &repository.id, now)?.write(files, symbols, references, edges)?;
            tx.commit()?;
            repository.last_indexed_at = Some(now);
            Ok((repository, result))
        })
    }
}

struct RunWriter<'t, 'c> {
    tx: &'t Transaction<'c>,
    repository_id: &'t str,
    repository: String,
    now: i64,
    file_ids: HashMap<String, String>,
    symbol_ids: HashMap<SymbolKey, String>,
}

impl<'t, 'c> RunWriter<'t, 'c> {
    fn new(tx: &'t Transaction<'c>, repository_id: &'t str, now: i64) -> Result<Self> {
        let repository: String = tx
            .query_row(
                "SELECT full_name FROM repositories WHERE id = ?1",
                params![repository_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::RepositoryNotFound(repository_id.to_string()))?;

        Ok(Self {
            tx,
            repository_id,
            repository,
            now,
            file_ids: HashMap::new(),
            symbol_ids: HashMap::new(),
        })
    }

    fn write(
        mut self,
        files: &[SourceFile],
        symbols: &[Symbol],
        references: &[Reference],
        edges: &[DependencyEdge],
    ) -> Result<StorageResult> {
        let previous = self.derived_keys()?;
        self.clear_derived()?;

        let mut result = StorageResult::default();
        let (stored, removed) = self.write_files(files)?;
        result.files_stored = stored;
        result.files_removed = removed;
        result.symbols_stored = self.write_symbols(symbols)?;
        result.references_stored = self.write_references(references)?;
        result.edges_stored = self.write_edges(edges)?;

        let current = self.derived_keys()?;
        for deletion in previous.difference(&current) {
            deletion.record(self.tx, self.now)?;
        }

        self.tx.execute(
            "UPDATE repositories SET last_indexed_at = ?2 WHERE id = ?1",
            params![self.repository_id, self.now],
        )?;

        debug!(
            "Stored {} files, {} symbols, {} references, {} edges for {}",
            result.files_stored, result.symbols_stored, result.references_stored, result.edges_stored, self.repository
        );
        Ok(result)
    }

    // =========================================================================
    // Files
    // =========================================================================

    fn write_files(&mut self, files: &[SourceFile]) -> Result<(u64, u64)> {
        let mut existing: HashMap<String, String> = HashMap::new();
        {
            let mut stmt = self
                .tx
                .prepare("SELECT path, id FROM files WHERE repository_id = ?1")?;
            let rows = stmt.query_map(params![self.repository_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (path, id) = row?;
                existing.insert(path, id);
            }
        }

        let mut upsert = self.tx.prepare(
            r#"
            INSERT INTO files (id, repository_id, path, content, language, size, content_hash, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(repository_id, path) DO UPDATE SET
                content = excluded.content,
                language = excluded.language,
                size = excluded.size,
                content_hash = excluded.content_hash,
                indexed_at = excluded.indexed_at
            "#,
        )?;
        for file in files {
            let id = existing
                .get(&file.path)
                .cloned()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            upsert.execute(params![
                id,
                self.repository_id,
                file.path,
                file.content,
                file.language.as_str(),
                file.size as i64,
                file.content_hash,
                file.indexed_at,
            ])?;
            self.file_ids.insert(file.path.clone(), id);
        }
        drop(upsert);

        let mut removed = 0;
        for (path, id) in &existing {
            if self.file_ids.contains_key(path) {
                continue;
            }
            self.tx.execute("DELETE FROM files WHERE id = ?1", params![id])?;
            Deletion::File {
                repository: self.repository.clone(),
                path: path.clone(),
            }
            .record(self.tx, self.now)?;
            removed += 1;
        }

        Ok((self.file_ids.len() as u64, removed))
    }

    fn file_id(&self, path: &str) -> Result<&str> {
        self.file_ids
            .get(path)
            .map(String::as_str)
            .ok_or_else(|| Error::Integrity(format!("{} is not part of this run", path)))
    }

    // =========================================================================
    // Symbols, References and Edges
    // =========================================================================

    fn write_symbols(&mut self, symbols: &[Symbol]) -> Result<u64> {
        let mut insert = self.tx.prepare(
            r#"
            INSERT INTO symbols (id, file_id, repository_id, name, kind, line_start, line_end, signature, documentation, is_exported)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(file_id, name, line_start) DO NOTHING
            "#,
        )?;
        let mut ids = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let file_id = self.file_id(&symbol.file_path)?;
            let id = Uuid::new_v4().to_string();
            let inserted = insert.execute(params![
                id,
                file_id,
                self.repository_id,
                symbol.name,
                symbol.kind.as_str(),
                symbol.line_start,
                symbol.line_end,
                symbol.signature,
                symbol.documentation,
                symbol.is_exported,
            ])?;
            if inserted > 0 {
                ids.insert(symbol.key(), id);
            }
        }
        drop(insert);

        let stored = ids.len() as u64;
        self.symbol_ids = ids;
        Ok(stored)
    }

    fn write_references(&self, references: &[Reference]) -> Result<u64> {
        let mut insert = self.tx.prepare(
            r#"
            INSERT INTO symbol_references (
                id, file_id, repository_id, symbol_name, target_symbol_id, target_file_path,
                line, column_number, reference_type, metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(file_id, line, column_number, reference_type, symbol_name) DO NOTHING
            "#,
        )?;
        let mut stored = 0;
        for reference in references {
            let file_id = self.file_id(&reference.file_path)?;
            let target = reference
                .target_symbol
                .as_ref()
                .and_then(|key| self.symbol_ids.get(key));
            stored += insert.execute(params![
                Uuid::new_v4().to_string(),
                file_id,
                self.repository_id,
                reference.name,
                target,
                reference.target_file_path,
                reference.line,
                reference.column,
                reference.kind.as_str(),
                serde_json::to_string(&reference.metadata)?,
            ])? as u64;
        }
        Ok(stored)
    }

    fn write_edges(&self, edges: &[DependencyEdge]) -> Result<u64> {
        let mut insert = self.tx.prepare(
            r#"
            INSERT INTO dependency_edges (
                id, repository_id, edge_key, edge_type,
                from_file_id, to_file_id, from_symbol_id, to_symbol_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(repository_id, edge_key) DO NOTHING
            "#,
        )?;
        let mut stored = 0;
        for edge in edges {
            if !edge.is_well_formed() {
                return Err(Error::Integrity(format!("edge {} has no complete endpoint pair", edge.edge_key())));
            }
            let from_file = edge.from_file.as_deref().map(|p| self.file_id(p)).transpose()?;
            let to_file = edge.to_file.as_deref().map(|p| self.file_id(p)).transpose()?;
            let from_symbol = edge.from_symbol.as_ref().and_then(|k| self.symbol_ids.get(k));
            let to_symbol = edge.to_symbol.as_ref().and_then(|k| self.symbol_ids.get(k));
            stored += insert.execute(params![
                Uuid::new_v4().to_string(),
                self.repository_id,
                edge.edge_key(),
                edge.kind.as_str(),
                from_file,
                to_file,
                from_symbol,
                to_symbol,
            ])? as u64;
        }
        Ok(stored)
    }

    fn clear_derived(&self) -> Result<()> {
        for table in ["dependency_edges", "symbol_references", "symbols"] {
            self.tx.execute(
                &format!("DELETE FROM {} WHERE repository_id = ?1", table),
                params![self.repository_id],
            )?;
        }
        Ok(())
    }

    /// Natural keys of every derived row currently stored for the repository
    fn derived_keys(&self) -> Result<HashSet<Deletion>> {
        let mut keys = HashSet::new();
        let repository = &self.repository;

        let mut stmt = self.tx.prepare(
            r#"
            SELECT f.path, s.name, s.line_start
            FROM symbols s JOIN files f ON f.id = s.file_id
            WHERE s.repository_id = ?1
            "#,
        )?;
        let rows = stmt.query_map(params![self.repository_id], |row| {
            Ok(Deletion::Symbol {
                repository: repository.clone(),
                file_path: row.get(0)?,
                name: row.get(1)?,
                line_start: row.get(2)?,
            })
        })?;
        for row in rows {
            keys.insert(row?);
        }

        let mut stmt = self.tx.prepare(
            r#"
            SELECT f.path, r.line, r.column_number, r.reference_type, r.symbol_name
            FROM symbol_references r JOIN files f ON f.id = r.file_id
            WHERE r.repository_id = ?1
            "#,
        )?;
        let rows = stmt.query_map(params![self.repository_id], |row| {
            Ok(Deletion::Reference {
                repository: repository.clone(),
                file_path: row.get(0)?,
                line: row.get(1)?,
                column: row.get(2)?,
                kind: row.get(3)?,
                name: row.get(4)?,
            })
        })?;
        for row in rows {
            keys.insert(row?);
        }

        let mut stmt = self
            .tx
            .prepare("SELECT edge_key FROM dependency_edges WHERE repository_id = ?1")?;
        let rows = stmt.query_map(params![self.repository_id], |row| {
            Ok(Deletion::DependencyEdge {
                repository: repository.clone(),
                edge_key: row.get(0)?,
            })
        })?;
        for row in rows {
            keys.insert(row?);
        }

        Ok(keys)
    }
}
