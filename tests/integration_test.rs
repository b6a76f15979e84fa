//! Integration tests for codeatlas
//!
//! These tests verify the end-to-end workflow of indexing, querying and
//! syncing real source trees on disk.

use std::path::Path;

use codeatlas::config::IndexConfig;
use codeatlas::db::Store;
use codeatlas::graph::detect_cycles;
use codeatlas::resolver::resolve_import;
use codeatlas::sync;
use codeatlas::types::{
    DependencyEdge, Direction, EdgeKind, RepositoryDescriptor, ReferenceKind, SourceFile, Symbol, SymbolKind,
};
use codeatlas::{index_repository, Error};
use tempfile::{tempdir, TempDir};

const REPO: &str = "acme/web";

/// Write `files` under a fresh temporary directory
fn source_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }
    dir
}

fn index(store: &Store, root: &Path) -> codeatlas::types::IndexStats {
    index_repository(store, &RepositoryDescriptor::new(REPO, root), &IndexConfig::default()).unwrap()
}

fn without_repository_ids(mut edges: Vec<DependencyEdge>) -> Vec<DependencyEdge> {
    for edge in &mut edges {
        edge.repository_id.clear();
    }
    edges
}

#[test]
fn test_util_and_main_scenario() {
    let dir = source_tree(&[
        ("util.ts", "export function add(a: number, b: number): number {\n  return a + b;\n}\n"),
        ("main.ts", "import { add } from \"./util\";\nadd(1, 2);\n"),
    ]);
    let store = Store::in_memory().unwrap();
    let stats = index(&store, dir.path());
    assert_eq!(stats.files_indexed, 2);

    let symbols = store.load_symbols(REPO).unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "add");
    assert_eq!(symbols[0].kind, SymbolKind::Function);
    assert_eq!(symbols[0].file_path, "util.ts");

    let references = store.load_references(REPO).unwrap();
    let imports: Vec<_> = references.iter().filter(|r| r.kind == ReferenceKind::Import).collect();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].target_file_path.as_deref(), Some("util.ts"));

    let calls: Vec<_> = references.iter().filter(|r| r.kind == ReferenceKind::Call).collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "add");
    assert_eq!(calls[0].target_symbol.as_ref().map(|k| k.file_path.as_str()), Some("util.ts"));

    let edges = store.load_edges(REPO).unwrap();
    let file_imports: Vec<_> = edges.iter().filter(|e| e.kind == EdgeKind::FileImport).collect();
    assert_eq!(file_imports.len(), 1);
    assert_eq!(file_imports[0].from_file.as_deref(), Some("main.ts"));
    assert_eq!(file_imports[0].to_file.as_deref(), Some("util.ts"));
}

#[test]
fn test_resolution_correctness() {
    let known = ["a.ts".to_string(), "b.ts".to_string()].into_iter().collect();
    assert_eq!(resolve_import("./b", "a.ts", &known), Some("b.ts".to_string()));
    assert_eq!(resolve_import("@pkg/x", "a.ts", &known), None);
}

#[test]
fn test_cycle_detected_from_any_start() {
    let dir = source_tree(&[
        ("c.ts", "import { a } from './a';\nexport const c = () => a();\n"),
        ("a.ts", "import { b } from './b';\nexport const a = () => b();\n"),
        ("b.ts", "import { c } from './c';\nexport const b = () => c();\n"),
    ]);
    let store = Store::in_memory().unwrap();
    let stats = index(&store, dir.path());
    assert_eq!(stats.circular_dependencies, 1);

    let cycles = detect_cycles(&store.load_edges(REPO).unwrap());
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].nodes(), ["a.ts", "b.ts", "c.ts"]);

    for start in ["a.ts", "b.ts", "c.ts"] {
        let result = store
            .query_dependencies(start, Direction::Dependencies, 3, false, Some(REPO))
            .unwrap();
        assert_eq!(result.cycles.len(), 1, "start {}", start);
        assert!(result.cycles[0].contains("a.ts"));
        assert!(result.cycles[0].contains("b.ts"));
        assert!(result.cycles[0].contains("c.ts"));
    }
}

#[test]
fn test_same_file_symbol_wins() {
    let dir = source_tree(&[
        ("one.ts", "export function foo() {}\nexport function run() {\n  foo();\n}\n"),
        ("two.ts", "export function foo() {}\n"),
    ]);
    let store = Store::in_memory().unwrap();
    index(&store, dir.path());

    let references = store.load_references(REPO).unwrap();
    let call = references
        .iter()
        .find(|r| r.kind == ReferenceKind::Call && r.name == "foo")
        .unwrap();
    assert_eq!(call.file_path, "one.ts");
    let target = call.target_symbol.as_ref().unwrap();
    assert_eq!(target.file_path, "one.ts");
    assert_eq!(target.line_start, 1);
}

#[test]
fn test_invalid_file_is_skipped() {
    let mut files: Vec<(String, String)> = (0..10)
        .map(|i| (format!("valid{}.ts", i), format!("export const value{} = {};\n", i, i)))
        .collect();
    files.push(("broken.ts".to_string(), "export function broken( {\n  return ;;\n".to_string()));
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let dir = source_tree(&refs);

    let store = Store::in_memory().unwrap();
    let stats = index(&store, dir.path());
    assert_eq!(stats.files_indexed, 10);
    assert_eq!(stats.parse_failures.len(), 1);
    assert_eq!(stats.parse_failures[0].path, "broken.ts");
    assert_eq!(stats.symbols_extracted, 10);
}

#[test]
fn test_search_one_in_hundred() {
    let mut files: Vec<(String, String)> = (0..99)
        .map(|i| (format!("src/module{}.ts", i), format!("export const value{} = {};\n", i, i)))
        .collect();
    files.push((
        "src/aquarium.ts".to_string(),
        "// the zebrafish tank needs cleaning\nexport const tank = 1;\n".to_string(),
    ));
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let dir = source_tree(&refs);

    let store = Store::in_memory().unwrap();
    assert_eq!(index(&store, dir.path()).files_indexed, 100);

    let hits = store.search("zebrafish", None, 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "src/aquarium.ts");
    assert!(!hits[0].snippet.is_empty());
    assert!(hits[0].snippet.contains("<mark>zebrafish</mark>"));

    assert!(store.search("", None, 10).unwrap().is_empty());
    assert!(store.search("kraken", None, 10).unwrap().is_empty());
}

#[test]
fn test_dependents_by_depth() {
    let dir = source_tree(&[
        ("core.ts", "export const core = 1;\n"),
        ("d1.ts", "import { core } from './core';\nexport const d1 = core;\n"),
        ("d2.ts", "import { core } from './core';\nexport const d2 = core;\n"),
        ("d3.ts", "import { core } from './core';\nexport const d3 = core;\n"),
        ("i1.ts", "import { d1 } from './d1';\n"),
        ("i2.ts", "import { d1 } from './d1';\n"),
        ("i3.ts", "import { d2 } from './d2';\n"),
        ("i4.ts", "import { d3 } from './d3';\n"),
        ("i5.ts", "import { d3 } from './d3';\n"),
        ("core.test.ts", "import { core } from './core';\n"),
    ]);
    let store = Store::in_memory().unwrap();
    index(&store, dir.path());

    let shallow = store
        .query_dependencies("core.ts", Direction::Dependents, 1, false, None)
        .unwrap();
    assert_eq!(shallow.repository.as_deref(), Some(REPO));
    assert_eq!(shallow.direct_dependents(), ["d1.ts", "d2.ts", "d3.ts"]);
    assert!(shallow.indirect_dependents().is_empty());
    assert!(shallow.depth_limited);

    let deep = store
        .query_dependencies("core.ts", Direction::Dependents, 2, false, None)
        .unwrap();
    assert_eq!(deep.direct_dependents(), ["d1.ts", "d2.ts", "d3.ts"]);
    let indirect: Vec<&str> = deep.indirect_dependents().into_iter().map(String::as_str).collect();
    assert_eq!(indirect, ["i1.ts", "i2.ts", "i3.ts", "i4.ts", "i5.ts"]);

    let with_tests = store
        .query_dependencies("core.ts", Direction::Dependents, 1, true, None)
        .unwrap();
    assert_eq!(with_tests.direct_dependents().len(), 4);

    let missing = store
        .query_dependencies("nope.ts", Direction::Both, 1, false, None)
        .unwrap();
    assert!(missing.repository.is_none());
    assert!(missing.dependents.iter().all(|l| l.files.is_empty()));

    assert!(matches!(
        store.query_dependencies("core.ts", Direction::Both, 6, false, None),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_reindex_is_idempotent() {
    let dir = source_tree(&[
        ("util.ts", "/** Adds numbers */\nexport function add(a: number, b: number) { return a + b; }\n"),
        ("main.ts", "import { add } from './util';\nexport function main() {\n  return add(1, 2);\n}\n"),
    ]);
    let store = Store::in_memory().unwrap();
    index(&store, dir.path());
    let symbols = store.load_symbols(REPO).unwrap();
    let references = store.load_references(REPO).unwrap();
    let edges = store.load_edges(REPO).unwrap();
    let files = store.list_recent_files(10, Some(REPO)).unwrap();

    index(&store, dir.path());
    assert_eq!(store.load_symbols(REPO).unwrap(), symbols);
    assert_eq!(store.load_references(REPO).unwrap(), references);
    assert_eq!(store.load_edges(REPO).unwrap(), edges);

    let mut before: Vec<_> = files.iter().map(|f| (f.path.clone(), f.id.clone())).collect();
    let mut after: Vec<_> = store
        .list_recent_files(10, Some(REPO))
        .unwrap()
        .into_iter()
        .map(|f| (f.path, f.id))
        .collect();
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[test]
fn test_export_import_round_trip() {
    let dir = source_tree(&[
        ("src/util.ts", "export function add(a: number, b: number) { return a + b; }\n"),
        ("src/main.ts", "import { add } from './util';\nexport function main() {\n  return add(1, 2);\n}\n"),
        ("src/types.ts", "export interface Point {\n  x: number;\n  y: number;\n}\n"),
    ]);
    let db_dir = tempdir().unwrap();
    let source = Store::open(db_dir.path().join("source.db"), 2).unwrap();
    index(&source, dir.path());
    source.create_project("platform", None).unwrap();
    source.add_repository_to_project("platform", REPO).unwrap();

    let export_dir = tempdir().unwrap();
    let exported = sync::export(&source, export_dir.path(), false).unwrap();
    assert!(exported.tables_skipped.is_empty());
    assert!(export_dir.path().join("deletions.jsonl").exists());

    let target = Store::open(db_dir.path().join("target.db"), 2).unwrap();
    let imported = sync::import(&target, export_dir.path()).unwrap();
    assert!(imported.errors.is_empty());

    assert_eq!(target.load_symbols(REPO).unwrap(), source.load_symbols(REPO).unwrap());
    assert_eq!(target.load_references(REPO).unwrap(), source.load_references(REPO).unwrap());
    assert_eq!(
        without_repository_ids(target.load_edges(REPO).unwrap()),
        without_repository_ids(source.load_edges(REPO).unwrap())
    );
    assert_eq!(target.list_projects().unwrap()[0].repositories, vec![REPO]);

    let hits = target.search("Point", Some(REPO), 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "src/types.ts");

    let again = sync::export(&source, export_dir.path(), false).unwrap();
    assert!(again.tables_exported.is_empty());
}

#[test]
fn test_deleted_file_propagates_through_sync() {
    let dir = source_tree(&[
        ("a.ts", "import { b } from './b';\nexport const a = b;\n"),
        ("b.ts", "export const b = 1;\n"),
    ]);
    let source = Store::in_memory().unwrap();
    index(&source, dir.path());
    let export_dir = tempdir().unwrap();
    sync::export(&source, export_dir.path(), false).unwrap();

    let target = Store::in_memory().unwrap();
    sync::import(&target, export_dir.path()).unwrap();
    assert_eq!(target.stats().unwrap().total_files, 2);

    std::fs::remove_file(dir.path().join("a.ts")).unwrap();
    index(&source, dir.path());
    let exported = sync::export(&source, export_dir.path(), false).unwrap();
    assert!(exported.deletions >= 1);

    let imported = sync::import(&target, export_dir.path()).unwrap();
    assert!(imported.rows_deleted >= 1);
    let files = target.list_recent_files(10, Some(REPO)).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "b.ts");
    assert!(target.load_edges(REPO).unwrap().is_empty());
}

#[test]
fn test_failed_run_leaves_previous_index() {
    let dir = source_tree(&[("util.ts", "export function add(a: number, b: number) { return a + b; }\n")]);
    let store = Store::in_memory().unwrap();
    index(&store, dir.path());
    let repository = store.get_repository(REPO).unwrap().unwrap();

    let files = vec![SourceFile::new("other.ts", "export const x = 1;\n", 7)];
    let ghost = Symbol {
        file_path: "ghost.ts".to_string(),
        name: "x".to_string(),
        kind: SymbolKind::Constant,
        line_start: 1,
        line_end: 1,
        signature: None,
        documentation: None,
        is_exported: true,
    };
    assert!(store.store(&repository.id, &files, &[ghost], &[], &[]).is_err());

    let recent = store.list_recent_files(10, Some(REPO)).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].path, "util.ts");
    assert_eq!(store.load_symbols(REPO).unwrap().len(), 1);
}

#[test]
fn test_failed_first_run_leaves_no_repository() {
    let store = Store::in_memory().unwrap();
    let descriptor = RepositoryDescriptor::new(REPO, "/tmp/acme-web");
    let files = vec![SourceFile::new("other.ts", "export const x = 1;\n", 7)];
    let ghost = Symbol {
        file_path: "ghost.ts".to_string(),
        name: "x".to_string(),
        kind: SymbolKind::Constant,
        line_start: 1,
        line_end: 1,
        signature: None,
        documentation: None,
        is_exported: true,
    };

    let err = store
        .store_repository(&descriptor, "new-id", &files, &[ghost], &[], &[])
        .unwrap_err();
    assert!(matches!(err, Error::Integrity(_)));
    assert!(store.get_repository(REPO).unwrap().is_none());
    assert!(store.list_repositories().unwrap().is_empty());
    assert_eq!(store.stats().unwrap().total_files, 0);
}

#[test]
fn test_delete_repository_cascades() {
    let dir = source_tree(&[
        ("util.ts", "export function add(a: number, b: number) { return a + b; }\n"),
        ("main.ts", "import { add } from './util';\nadd(1, 2);\n"),
    ]);
    let store = Store::in_memory().unwrap();
    index(&store, dir.path());
    assert!(store.delete_repository(REPO).unwrap());

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_repositories, 0);
    assert_eq!(stats.total_files, 0);
    assert_eq!(stats.total_symbols, 0);
    assert_eq!(stats.total_references, 0);
    assert_eq!(stats.total_edges, 0);
    assert!(store.search("add", None, 10).unwrap().is_empty());
    assert!(matches!(store.load_symbols(REPO), Err(Error::RepositoryNotFound(_))));
}

#[test]
fn test_gitignore_and_excluded_dirs() {
    let dir = source_tree(&[
        ("src/app.ts", "export const app = 1;\n"),
        ("node_modules/lib/index.js", "module.exports = {};\n"),
        ("dist/app.js", "var app = 1;\n"),
        ("README.md", "# readme\n"),
    ]);
    let store = Store::in_memory().unwrap();
    let stats = index(&store, dir.path());
    assert_eq!(stats.files_indexed, 1);
}

#[test]
fn test_path_alias_resolution() {
    let dir = source_tree(&[
        (
            "tsconfig.json",
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@lib/*": ["src/lib/*"] } } }"#,
        ),
        ("src/lib/math.ts", "export function square(n: number) { return n * n; }\n"),
        ("src/app.ts", "import { square } from '@lib/math';\nsquare(3);\n"),
    ]);
    let store = Store::in_memory().unwrap();
    index(&store, dir.path());

    let result = store
        .query_dependencies("src/app.ts", Direction::Dependencies, 1, false, Some(REPO))
        .unwrap();
    assert_eq!(result.direct_dependencies(), ["src/lib/math.ts"]);
}
