//! Read queries: full-text search, recent files, dependency traversal
//! and per-repository loaders

use rusqlite::{params, Connection, OptionalExtension};

use super::{repository_id, Store};
use crate::error::{Error, Result};
use crate::graph::{traverse, Adjacency, CycleDetector};
use crate::types::{
    DependencyEdge, DependencyResult, Direction, EdgeKind, FileSummary, Language, Reference, ReferenceKind,
    ReferenceMetadata, SearchHit, Symbol, SymbolKey, SymbolKind,
};

/// Deepest dependency traversal a query may request
pub const MAX_QUERY_DEPTH: u32 = 5;

/// Quote a search term as a single FTS5 phrase
fn fts_phrase(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

impl Store {
    // =========================================================================
    // Search
    // =========================================================================

    /// BM25-ranked full-text search over file paths and content
    pub fn search(&self, term: &str, repository: Option<&str>, limit: usize) -> Result<Vec<SearchHit>> {
        let term = term.trim();
        if term.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        self.read(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT r.full_name, f.path,
                       snippet(files_fts, 1, '<mark>', '</mark>', '...', 16),
                       bm25(files_fts), f.indexed_at, f.id
                FROM files_fts
                JOIN files f ON f.fts_rowid = files_fts.rowid
                JOIN repositories r ON r.id = f.repository_id
                WHERE files_fts MATCH ?1 AND (?2 IS NULL OR r.full_name = ?2)
                ORDER BY bm25(files_fts), f.path
                LIMIT ?3
                "#,
            )?;
            let rows = stmt.query_map(params![fts_phrase(term), repository, limit as i64], |row| {
                Ok((
                    SearchHit {
                        repository: row.get(0)?,
                        path: row.get(1)?,
                        snippet: row.get(2)?,
                        score: -row.get::<_, f64>(3)?,
                        dependencies: Vec::new(),
                        indexed_at: row.get(4)?,
                    },
                    row.get::<_, String>(5)?,
                ))
            })?;

            let mut hits = Vec::new();
            for row in rows {
                let (mut hit, file_id) = row?;
                hit.dependencies = file_imports(conn, &file_id)?;
                hits.push(hit);
            }
            Ok(hits)
        })
    }

    /// Most recently indexed files first
    pub fn list_recent_files(&self, limit: usize, repository: Option<&str>) -> Result<Vec<FileSummary>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT f.id, r.full_name, f.path, f.language, f.size, f.content_hash, f.indexed_at
                FROM files f
                JOIN repositories r ON r.id = f.repository_id
                WHERE ?1 IS NULL OR r.full_name = ?1
                ORDER BY f.indexed_at DESC, r.full_name, f.path
                LIMIT ?2
                "#,
            )?;
            let rows = stmt.query_map(params![repository, limit as i64], |row| {
                Ok(FileSummary {
                    id: row.get(0)?,
                    repository: row.get(1)?,
                    path: row.get(2)?,
                    language: Language::from_name(&row.get::<_, String>(3)?),
                    size: row.get::<_, i64>(4)? as u64,
                    content_hash: row.get(5)?,
                    indexed_at: row.get(6)?,
                })
            })?;

            let mut files = Vec::new();
            for row in rows {
                files.push(row?);
            }
            Ok(files)
        })
    }

    // =========================================================================
    // Dependency Queries
    // =========================================================================

    /// Bounded traversal of the file-import graph around `file_path`
    pub fn query_dependencies(
        &self,
        file_path: &str,
        direction: Direction,
        depth: u32,
        include_tests: bool,
        repository: Option<&str>,
    ) -> Result<DependencyResult> {
        if !(1..=MAX_QUERY_DEPTH).contains(&depth) {
            return Err(Error::InvalidArgument(format!(
                "depth must be between 1 and {}, got {}",
                MAX_QUERY_DEPTH, depth
            )));
        }

        self.read(|conn| {
            let mut result = DependencyResult::empty(file_path, direction, depth);
            let Some((repo_id, full_name)) = locate_file(conn, file_path, repository)? else {
                return Ok(result);
            };
            result.repository = Some(full_name);

            let (forward, reverse) = import_adjacency(conn, &repo_id)?;
            let mut followed = Adjacency::new();

            if direction.includes_dependencies() {
                let walk = traverse(&forward, file_path, depth, include_tests);
                for (from, to) in walk.edges {
                    followed.entry(from).or_default().insert(to);
                }
                result.dependencies = walk.levels;
                result.depth_limited |= walk.depth_limited;
            }
            if direction.includes_dependents() {
                let walk = traverse(&reverse, file_path, depth, include_tests);
                // Reverse edges point at importers; store them in import direction
                for (imported, importer) in walk.edges {
                    followed.entry(importer).or_default().insert(imported);
                }
                result.dependents = walk.levels;
                result.depth_limited |= walk.depth_limited;
            }

            let detection = CycleDetector::default().detect_in(&followed);
            result.cycles = detection.cycles;
            result.depth_limited |= detection.depth_limited;
            Ok(result)
        })
    }

    // =========================================================================
    // Repository Loaders
    // =========================================================================

    /// All symbols of a repository ordered by file and line
    pub fn load_symbols(&self, full_name: &str) -> Result<Vec<Symbol>> {
        self.read(|conn| {
            let repo_id = require_repository(conn, full_name)?;
            let mut stmt = conn.prepare(
                r#"
                SELECT f.path, s.name, s.kind, s.line_start, s.line_end, s.signature, s.documentation, s.is_exported
                FROM symbols s JOIN files f ON f.id = s.file_id
                WHERE s.repository_id = ?1
                ORDER BY f.path, s.line_start, s.name
                "#,
            )?;
            let rows = stmt.query_map(params![repo_id], row_to_symbol)?;

            let mut symbols = Vec::new();
            for row in rows {
                symbols.push(row?);
            }
            Ok(symbols)
        })
    }

    /// All references of a repository ordered by file and position
    pub fn load_references(&self, full_name: &str) -> Result<Vec<Reference>> {
        self.read(|conn| {
            let repo_id = require_repository(conn, full_name)?;
            let mut stmt = conn.prepare(
                r#"
                SELECT f.path, r.symbol_name, r.reference_type, r.line, r.column_number,
                       r.target_file_path, tf.path, ts.name, ts.line_start, r.metadata
                FROM symbol_references r
                JOIN files f ON f.id = r.file_id
                LEFT JOIN symbols ts ON ts.id = r.target_symbol_id
                LEFT JOIN files tf ON tf.id = ts.file_id
                WHERE r.repository_id = ?1
                ORDER BY f.path, r.line, r.column_number, r.reference_type, r.symbol_name
                "#,
            )?;
            let rows = stmt.query_map(params![repo_id], |row| {
                let kind: String = row.get(2)?;
                let metadata: String = row.get(9)?;
                Ok((
                    Reference {
                        file_path: row.get(0)?,
                        name: row.get(1)?,
                        kind: ReferenceKind::from_str(&kind).unwrap_or(ReferenceKind::VariableReference),
                        line: row.get(3)?,
                        column: row.get(4)?,
                        target_file_path: row.get(5)?,
                        target_symbol: symbol_key(row.get(6)?, row.get(7)?, row.get(8)?),
                        metadata: ReferenceMetadata::default(),
                    },
                    metadata,
                ))
            })?;

            let mut references = Vec::new();
            for row in rows {
                let (mut reference, metadata) = row?;
                reference.metadata = serde_json::from_str(&metadata)?;
                references.push(reference);
            }
            Ok(references)
        })
    }

    /// All dependency edges of a repository ordered by edge key
    pub fn load_edges(&self, full_name: &str) -> Result<Vec<DependencyEdge>> {
        self.read(|conn| {
            let repo_id = require_repository(conn, full_name)?;
            let mut stmt = conn.prepare(
                r#"
                SELECT e.edge_type, ff.path, tf.path,
                       fsf.path, fs.name, fs.line_start,
                       tsf.path, ts.name, ts.line_start
                FROM dependency_edges e
                LEFT JOIN files ff ON ff.id = e.from_file_id
                LEFT JOIN files tf ON tf.id = e.to_file_id
                LEFT JOIN symbols fs ON fs.id = e.from_symbol_id
                LEFT JOIN files fsf ON fsf.id = fs.file_id
                LEFT JOIN symbols ts ON ts.id = e.to_symbol_id
                LEFT JOIN files tsf ON tsf.id = ts.file_id
                WHERE e.repository_id = ?1
                ORDER BY e.edge_key
                "#,
            )?;
            let rows = stmt.query_map(params![repo_id], |row| {
                let kind: String = row.get(0)?;
                Ok(DependencyEdge {
                    repository_id: repo_id.clone(),
                    kind: EdgeKind::from_str(&kind).unwrap_or(EdgeKind::FileImport),
                    from_file: row.get(1)?,
                    to_file: row.get(2)?,
                    from_symbol: symbol_key(row.get(3)?, row.get(4)?, row.get(5)?),
                    to_symbol: symbol_key(row.get(6)?, row.get(7)?, row.get(8)?),
                })
            })?;

            let mut edges = Vec::new();
            for row in rows {
                edges.push(row?);
            }
            Ok(edges)
        })
    }
}

fn symbol_key(file_path: Option<String>, name: Option<String>, line_start: Option<u32>) -> Option<SymbolKey> {
    Some(SymbolKey {
        file_path: file_path?,
        name: name?,
        line_start: line_start?,
    })
}

fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<Symbol> {
    let kind: String = row.get(2)?;
    Ok(Symbol {
        file_path: row.get(0)?,
        name: row.get(1)?,
        kind: SymbolKind::from_str(&kind).unwrap_or(SymbolKind::Variable),
        line_start: row.get(3)?,
        line_end: row.get(4)?,
        signature: row.get(5)?,
        documentation: row.get(6)?,
        is_exported: row.get(7)?,
    })
}

fn require_repository(conn: &Connection, full_name: &str) -> Result<String> {
    repository_id(conn, full_name)?.ok_or_else(|| Error::RepositoryNotFound(full_name.to_string()))
}

/// Import targets of one file, sorted
fn file_imports(conn: &Connection, file_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT DISTINCT tf.path
        FROM dependency_edges e
        JOIN files tf ON tf.id = e.to_file_id
        WHERE e.from_file_id = ?1 AND e.edge_type = 'file_import'
        ORDER BY tf.path
        "#,
    )?;
    let rows = stmt.query_map(params![file_id], |row| row.get(0))?;

    let mut paths = Vec::new();
    for row in rows {
        paths.push(row?);
    }
    Ok(paths)
}

/// Repository holding `file_path`: the named one, or else the most recently
/// indexed repository that contains the path
fn locate_file(conn: &Connection, file_path: &str, repository: Option<&str>) -> Result<Option<(String, String)>> {
    if let Some(full_name) = repository {
        let repo_id = require_repository(conn, full_name)?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM files WHERE repository_id = ?1 AND path = ?2",
                params![repo_id, file_path],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        return Ok(exists.then(|| (repo_id, full_name.to_string())));
    }

    let found = conn
        .query_row(
            r#"
            SELECT r.id, r.full_name
            FROM files f JOIN repositories r ON r.id = f.repository_id
            WHERE f.path = ?1
            ORDER BY r.last_indexed_at DESC, r.full_name
            LIMIT 1
            "#,
            params![file_path],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(found)
}

/// Forward (importer -> imported) and reverse adjacency of a repository
fn import_adjacency(conn: &Connection, repo_id: &str) -> Result<(Adjacency, Adjacency)> {
    let mut stmt = conn.prepare(
        r#"
        SELECT ff.path, tf.path
        FROM dependency_edges e
        JOIN files ff ON ff.id = e.from_file_id
        JOIN files tf ON tf.id = e.to_file_id
        WHERE e.repository_id = ?1 AND e.edge_type = 'file_import'
        "#,
    )?;
    let rows = stmt.query_map(params![repo_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut forward = Adjacency::new();
    let mut reverse = Adjacency::new();
    for row in rows {
        let (from, to) = row?;
        reverse.entry(to.clone()).or_default().insert(from.clone());
        forward.entry(from).or_default().insert(to);
    }
    Ok((forward, reverse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RepositoryDescriptor, SourceFile};

    fn store_with_imports(pairs: &[(&str, &str)]) -> Store {
        let store = Store::in_memory().unwrap();
        let repo = store
            .upsert_repository(&RepositoryDescriptor::new("acme/web", "/tmp/web"))
            .unwrap();

        let mut paths: Vec<&str> = pairs.iter().flat_map(|(a, b)| [*a, *b]).collect();
        paths.sort();
        paths.dedup();
        let files: Vec<SourceFile> = paths
            .iter()
            .map(|p| SourceFile::new(*p, format!("// {}\n", p), 1))
            .collect();
        let edges: Vec<DependencyEdge> = pairs
            .iter()
            .map(|(a, b)| DependencyEdge::file_import(&repo.id, a, b))
            .collect();
        store.store(&repo.id, &files, &[], &[], &edges).unwrap();
        store
    }

    #[test]
    fn test_fts_phrase_escapes_quotes() {
        assert_eq!(fts_phrase("foo"), "\"foo\"");
        assert_eq!(fts_phrase("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_search_blank_and_missing() {
        let store = store_with_imports(&[("a.ts", "b.ts")]);
        assert!(store.search("   ", None, 10).unwrap().is_empty());
        assert!(store.search("nothing-like-this", None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_hit_carries_dependencies() {
        let store = store_with_imports(&[("a.ts", "b.ts"), ("a.ts", "c.ts")]);
        let hits = store.search("a.ts", None, 10).unwrap();
        let hit = hits.iter().find(|h| h.path == "a.ts").unwrap();
        assert_eq!(hit.repository, "acme/web");
        assert_eq!(hit.dependencies, vec!["b.ts", "c.ts"]);
        assert!(hit.snippet.contains("<mark>"));
        assert!(store.search("a.ts", Some("other/repo"), 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_with_quotes_does_not_fail() {
        let store = store_with_imports(&[("a.ts", "b.ts")]);
        assert!(store.search("\"unbalanced", None, 10).is_ok());
    }

    #[test]
    fn test_recent_files() {
        let store = store_with_imports(&[("a.ts", "b.ts")]);
        let files = store.list_recent_files(1, None).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].language, Language::TypeScript);
        assert_eq!(store.list_recent_files(10, Some("acme/web")).unwrap().len(), 2);
        assert!(store.list_recent_files(10, Some("other/repo")).unwrap().is_empty());
    }

    #[test]
    fn test_dependency_depth_validation() {
        let store = store_with_imports(&[("a.ts", "b.ts")]);
        for depth in [0, 6] {
            let err = store
                .query_dependencies("a.ts", Direction::Both, depth, true, None)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_dependency_unknown_file() {
        let store = store_with_imports(&[("a.ts", "b.ts")]);
        let result = store
            .query_dependencies("missing.ts", Direction::Both, 2, true, None)
            .unwrap();
        assert!(result.repository.is_none());
        assert!(result.dependents.is_empty());
        assert!(result.dependencies.is_empty());
    }

    #[test]
    fn test_dependency_directions() {
        let store = store_with_imports(&[("a.ts", "b.ts"), ("b.ts", "c.ts"), ("x.ts", "b.ts")]);
        let result = store
            .query_dependencies("b.ts", Direction::Both, 1, true, Some("acme/web"))
            .unwrap();
        assert_eq!(result.repository.as_deref(), Some("acme/web"));
        assert_eq!(result.direct_dependents(), ["a.ts".to_string(), "x.ts".to_string()]);
        assert_eq!(result.direct_dependencies(), ["c.ts".to_string()]);

        let only_up = store
            .query_dependencies("b.ts", Direction::Dependents, 1, true, None)
            .unwrap();
        assert!(only_up.dependencies.is_empty());
    }

    #[test]
    fn test_dependency_cycles_reported() {
        let store = store_with_imports(&[("a.ts", "b.ts"), ("b.ts", "c.ts"), ("c.ts", "a.ts")]);
        let result = store
            .query_dependencies("a.ts", Direction::Dependencies, 3, true, None)
            .unwrap();
        assert_eq!(result.cycles.len(), 1);
        assert_eq!(result.cycles[0].nodes(), ["a.ts", "b.ts", "c.ts"]);

        let result = store
            .query_dependencies("a.ts", Direction::Dependents, 3, true, None)
            .unwrap();
        assert_eq!(result.cycles.len(), 1);
        assert_eq!(result.cycles[0].nodes(), ["a.ts", "b.ts", "c.ts"]);
    }

    #[test]
    fn test_dependency_unknown_repository() {
        let store = store_with_imports(&[("a.ts", "b.ts")]);
        let err = store
            .query_dependencies("a.ts", Direction::Both, 1, true, Some("other/repo"))
            .unwrap_err();
        assert!(matches!(err, Error::RepositoryNotFound(_)));
    }

    #[test]
    fn test_load_edges() {
        let store = store_with_imports(&[("a.ts", "b.ts")]);
        let edges = store.load_edges("acme/web").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::FileImport);
        assert_eq!(edges[0].from_file.as_deref(), Some("a.ts"));
        assert_eq!(edges[0].to_file.as_deref(), Some("b.ts"));
        assert!(store.load_symbols("acme/web").unwrap().is_empty());
        assert!(store.load_references("nobody/none").is_err());
    }
}
