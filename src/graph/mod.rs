//! Dependency graph construction
//!
//! Derives edges from extracted files, symbols and resolved references:
//! - `file_import`: importing file -> resolved target file
//! - `symbol_usage`: call / property access / type reference -> matched symbol
//!
//! Also links import bindings to the symbols they name in the target file.
//! Runs single-threaded over the full result set of one indexing run.

mod cycles;
mod traversal;

pub use cycles::{detect_cycles, Adjacency, CycleDetection, CycleDetector};
pub use traversal::{is_test_file, traverse, Traversal};

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::types::{
    DependencyEdge, EdgeKind, ImportStyle, Reference, ReferenceKind, SourceFile, Symbol, SymbolKey,
};

/// Outcome of matching a reference name against known symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolMatch<'a> {
    Unique(&'a Symbol),
    /// Several candidates in other files and none in the referencing file
    Ambiguous(usize),
    Missing,
}

/// Name -> symbols lookup built once per run
pub struct SymbolIndex<'a> {
    by_name: HashMap<&'a str, Vec<&'a Symbol>>,
    by_file: HashMap<&'a str, HashMap<&'a str, Vec<&'a Symbol>>>,
}

impl<'a> SymbolIndex<'a> {
    pub fn new(symbols: &'a [Symbol]) -> Self {
        let mut by_name: HashMap<&str, Vec<&Symbol>> = HashMap::new();
        let mut by_file: HashMap<&str, HashMap<&str, Vec<&Symbol>>> = HashMap::new();
        for symbol in symbols {
            by_name.entry(symbol.name.as_str()).or_default().push(symbol);
            by_file
                .entry(symbol.file_path.as_str())
                .or_default()
                .entry(symbol.name.as_str())
                .or_default()
                .push(symbol);
        }
        Self { by_name, by_file }
    }

    /// Same-file match first, then a unique match anywhere, otherwise no match
    pub fn lookup(&self, name: &str, file_path: &str) -> SymbolMatch<'a> {
        if let Some(local) = self.in_file(file_path, name) {
            return SymbolMatch::Unique(local);
        }
        match self.by_name.get(name).map(Vec::as_slice) {
            None | Some([]) => SymbolMatch::Missing,
            Some([only]) => SymbolMatch::Unique(*only),
            Some(candidates) => SymbolMatch::Ambiguous(candidates.len()),
        }
    }

    /// First symbol called `name` declared in `file_path`, exported ones first
    pub fn in_file(&self, file_path: &str, name: &str) -> Option<&'a Symbol> {
        let candidates = self.by_file.get(file_path)?.get(name)?;
        candidates
            .iter()
            .find(|s| s.is_exported)
            .or_else(|| candidates.first())
            .copied()
    }
}

/// Edges plus bookkeeping from one build
#[derive(Debug, Clone, Default)]
pub struct GraphBuild {
    pub edges: Vec<DependencyEdge>,
    /// Import bindings linked to a symbol in the target file
    pub linked_imports: usize,
    pub ambiguous: usize,
    pub unmatched: usize,
}

/// Converts extraction output into dependency edges
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build edges and set `target_symbol` on references that link to a symbol
    pub fn build(
        &self,
        files: &[SourceFile],
        symbols: &[Symbol],
        references: &mut [Reference],
        repository_id: &str,
    ) -> GraphBuild {
        let known: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
        let index = SymbolIndex::new(symbols);
        let mut build = GraphBuild::default();
        let mut seen: HashSet<String> = HashSet::new();

        for reference in references.iter_mut() {
            if !known.contains(reference.file_path.as_str()) {
                continue;
            }

            let edge = match reference.kind {
                ReferenceKind::Import => {
                    let Some(target) = reference.target_file_path.clone() else {
                        continue;
                    };
                    if !known.contains(target.as_str()) {
                        continue;
                    }
                    if matches!(
                        reference.metadata.import_style,
                        Some(ImportStyle::Named | ImportStyle::Aliased)
                    ) {
                        if let Some(symbol) = index.in_file(&target, &reference.name) {
                            reference.target_symbol = Some(symbol.key());
                            build.linked_imports += 1;
                        }
                    }
                    DependencyEdge::file_import(repository_id, &reference.file_path, &target)
                }
                kind if kind.links_symbols() => {
                    match index.lookup(&reference.name, &reference.file_path) {
                        SymbolMatch::Unique(symbol) => {
                            let to = symbol.key();
                            reference.target_symbol = Some(to.clone());
                            symbol_usage(repository_id, reference, to)
                        }
                        SymbolMatch::Ambiguous(candidates) => {
                            debug!(
                                "Ambiguous reference to {} at {}:{} ({} candidates), skipping",
                                reference.name, reference.file_path, reference.line, candidates
                            );
                            build.ambiguous += 1;
                            continue;
                        }
                        SymbolMatch::Missing => {
                            build.unmatched += 1;
                            continue;
                        }
                    }
                }
                _ => continue,
            };

            if seen.insert(edge.edge_key()) {
                build.edges.push(edge);
            }
        }

        if build.unmatched > 0 {
            warn!(
                "{} references matched no indexed symbol ({} ambiguous)",
                build.unmatched, build.ambiguous
            );
        }
        build
    }
}

fn symbol_usage(repository_id: &str, reference: &Reference, to: SymbolKey) -> DependencyEdge {
    DependencyEdge {
        repository_id: repository_id.to_string(),
        kind: EdgeKind::SymbolUsage,
        from_file: Some(reference.file_path.clone()),
        to_file: Some(to.file_path.clone()),
        from_symbol: reference.enclosing_key(),
        to_symbol: Some(to),
    }
}
