//! Database schema definition

/// Connection-level settings applied to every connection
pub const PRAGMAS: &str = r#"
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
"#;

/// Settings applied once by the writer on a file-backed database
pub const WRITER_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
"#;

pub const SCHEMA: &str = r#"
-- Repositories: one per indexed codebase
CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    full_name TEXT NOT NULL UNIQUE,
    git_url TEXT,
    default_branch TEXT NOT NULL DEFAULT 'main',
    last_indexed_at INTEGER
);

-- Files: full source text; fts_rowid backs the full-text index
CREATE TABLE IF NOT EXISTS files (
    fts_rowid INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    path TEXT NOT NULL,
    content TEXT NOT NULL,
    language TEXT NOT NULL,
    size INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    indexed_at INTEGER NOT NULL,
    UNIQUE (repository_id, path)
);

-- Symbols: named declarations
CREATE TABLE IF NOT EXISTS symbols (
    id TEXT PRIMARY KEY,
    file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN (
        'function', 'class', 'interface', 'type', 'variable', 'constant',
        'method', 'property', 'module', 'namespace', 'enum', 'enum_member'
    )),
    line_start INTEGER NOT NULL,
    line_end INTEGER NOT NULL,
    signature TEXT,
    documentation TEXT,
    is_exported INTEGER NOT NULL DEFAULT 0,
    UNIQUE (file_id, name, line_start)
);

-- References: use-sites; the target symbol is nulled, not deleted, with its symbol
CREATE TABLE IF NOT EXISTS symbol_references (
    id TEXT PRIMARY KEY,
    file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    symbol_name TEXT NOT NULL,
    target_symbol_id TEXT REFERENCES symbols(id) ON DELETE SET NULL,
    target_file_path TEXT,
    line INTEGER NOT NULL,
    column_number INTEGER NOT NULL,
    reference_type TEXT NOT NULL CHECK (reference_type IN (
        'import', 'call', 'extends', 'implements',
        'property_access', 'type_reference', 'variable_reference'
    )),
    metadata TEXT NOT NULL DEFAULT '{}',
    UNIQUE (file_id, line, column_number, reference_type, symbol_name)
);

-- Dependency edges: derived file->file and symbol->symbol relationships
CREATE TABLE IF NOT EXISTS dependency_edges (
    id TEXT PRIMARY KEY,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    edge_key TEXT NOT NULL,
    edge_type TEXT NOT NULL CHECK (edge_type IN ('file_import', 'symbol_usage')),
    from_file_id TEXT REFERENCES files(id) ON DELETE CASCADE,
    to_file_id TEXT REFERENCES files(id) ON DELETE CASCADE,
    from_symbol_id TEXT REFERENCES symbols(id) ON DELETE CASCADE,
    to_symbol_id TEXT REFERENCES symbols(id) ON DELETE CASCADE,
    CHECK (
        (from_file_id IS NOT NULL AND to_file_id IS NOT NULL)
        OR (from_symbol_id IS NOT NULL AND to_symbol_id IS NOT NULL)
    ),
    UNIQUE (repository_id, edge_key)
);

-- Projects: optional groupings of repositories
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS project_repositories (
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    PRIMARY KEY (project_id, repository_id)
);

-- Natural keys removed since the last export
CREATE TABLE IF NOT EXISTS sync_deletions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_name TEXT NOT NULL,
    natural_key TEXT NOT NULL,
    deleted_at INTEGER NOT NULL
);

-- Full-text index over file path and content
CREATE VIRTUAL TABLE IF NOT EXISTS files_fts USING fts5(
    path,
    content,
    content = 'files',
    content_rowid = 'fts_rowid'
);

CREATE TRIGGER IF NOT EXISTS files_fts_insert AFTER INSERT ON files BEGIN
    INSERT INTO files_fts (rowid, path, content) VALUES (new.fts_rowid, new.path, new.content);
END;

CREATE TRIGGER IF NOT EXISTS files_fts_delete AFTER DELETE ON files BEGIN
    INSERT INTO files_fts (files_fts, rowid, path, content)
    VALUES ('delete', old.fts_rowid, old.path, old.content);
END;

CREATE TRIGGER IF NOT EXISTS files_fts_update AFTER UPDATE OF path, content ON files BEGIN
    INSERT INTO files_fts (files_fts, rowid, path, content)
    VALUES ('delete', old.fts_rowid, old.path, old.content);
    INSERT INTO files_fts (rowid, path, content) VALUES (new.fts_rowid, new.path, new.content);
END;

-- Indexes for efficient queries
CREATE INDEX IF NOT EXISTS idx_files_repository ON files(repository_id);
CREATE INDEX IF NOT EXISTS idx_files_indexed_at ON files(indexed_at);
CREATE INDEX IF NOT EXISTS idx_files_path ON files(path);

CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_repository ON symbols(repository_id);

CREATE INDEX IF NOT EXISTS idx_references_file ON symbol_references(file_id);
CREATE INDEX IF NOT EXISTS idx_references_repository ON symbol_references(repository_id);
CREATE INDEX IF NOT EXISTS idx_references_target ON symbol_references(target_symbol_id);

CREATE INDEX IF NOT EXISTS idx_edges_repository ON dependency_edges(repository_id);
CREATE INDEX IF NOT EXISTS idx_edges_from_file ON dependency_edges(from_file_id);
CREATE INDEX IF NOT EXISTS idx_edges_to_file ON dependency_edges(to_file_id);
CREATE INDEX IF NOT EXISTS idx_edges_from_symbol ON dependency_edges(from_symbol_id);
CREATE INDEX IF NOT EXISTS idx_edges_to_symbol ON dependency_edges(to_symbol_id);
"#;
