//! codeatlas: offline code intelligence for TypeScript and JavaScript
//!
//! Parses repositories with tree-sitter, extracts symbols and references,
//! resolves imports into a dependency graph and stores everything in SQLite
//! with a full-text index. The index can be exported to JSON lines and
//! imported elsewhere for version-controlled sharing.
//!
//! ## Pipeline
//!
//! 1. List source files (`workspace::SourceLister`)
//! 2. Parse and extract in parallel (`extraction`)
//! 3. Resolve imports, including tsconfig path aliases (`resolver`)
//! 4. Build dependency edges and detect cycles (`graph`)
//! 5. Store the run in one transaction (`db`)

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod resolver;
pub mod sync;
pub mod types;
pub mod workspace;

pub use config::Config;
pub use db::Store;
pub use error::{Error, Result};

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use config::IndexConfig;
use extraction::Extractor;
use graph::{CycleDetector, DependencyGraphBuilder};
use resolver::{ImportResolver, PathAliases};
use types::{IndexStats, RepositoryDescriptor, SourceFile};
use workspace::{Clock, SourceLister, SystemClock, WalkSourceLister};

/// Stack size for parser worker threads
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Indexes repositories into a store
pub struct Indexer<'s> {
    store: &'s Store,
    config: IndexConfig,
    lister: Box<dyn SourceLister>,
    clock: Arc<dyn Clock>,
}

impl<'s> Indexer<'s> {
    pub fn new(store: &'s Store, config: IndexConfig) -> Self {
        Self {
            store,
            lister: Box::new(WalkSourceLister::new(config.clone())),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_lister(mut self, lister: Box<dyn SourceLister>) -> Self {
        self.lister = lister;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Index one repository, replacing whatever was stored for it before.
    ///
    /// Unreadable and unparseable files are counted and skipped; only a
    /// storage failure fails the run, leaving the previous index intact.
    pub fn index(&self, descriptor: &RepositoryDescriptor) -> Result<IndexStats> {
        let root = &descriptor.root;
        if !root.is_dir() {
            return Err(Error::InvalidArgument(format!("{} is not a directory", root.display())));
        }
        info!("Indexing {} at {}", descriptor.full_name, root.display());

        let mut stats = IndexStats::default();
        let now = self.clock.now();

        let mut sources = Vec::new();
        for entry in self.lister.list(root) {
            match std::fs::read_to_string(&entry.absolute) {
                Ok(content) => sources.push(SourceFile::new(entry.relative, content, now)),
                Err(err) => {
                    warn!("Failed to read {}: {}", entry.absolute.display(), err);
                    stats.read_errors += 1;
                }
            }
        }

        let pool = self.thread_pool()?;
        let outcomes: Vec<_> = pool.install(|| {
            sources
                .par_iter()
                .map_init(Extractor::new, |extractor, file| {
                    extractor.extract_file(&file.path, &file.content)
                })
                .collect()
        });

        let mut files = Vec::with_capacity(sources.len());
        let mut symbols = Vec::new();
        let mut references = Vec::new();
        for (file, outcome) in sources.into_iter().zip(outcomes) {
            match outcome {
                Ok(extraction) => {
                    symbols.extend(extraction.symbols);
                    references.extend(extraction.references);
                    files.push(file);
                }
                Err(failure) => {
                    warn!("Failed to parse {}: {}", failure.path, failure.message);
                    stats.parse_failures.push(failure);
                }
            }
        }

        // A new repository only gets its row inside the storage transaction
        let repository_id = match self.store.get_repository(&descriptor.full_name)? {
            Some(existing) => existing.id,
            None => Uuid::new_v4().to_string(),
        };

        let known: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();
        let resolver = ImportResolver::new(known).with_aliases(PathAliases::load(root));
        let resolved = resolver.resolve_references(&mut references);
        debug!("Resolved {} import references", resolved);

        let build = DependencyGraphBuilder::new().build(&files, &symbols, &mut references, &repository_id);
        let detection = CycleDetector::new(self.config.cycle_depth).detect(&build.edges);
        for cycle in &detection.cycles {
            debug!("Circular dependency: {}", cycle.nodes().join(" -> "));
        }
        if !detection.cycles.is_empty() {
            info!("Found {} circular dependencies", detection.cycles.len());
        }

        let (_, stored) = self.store.store_repository(
            descriptor,
            &repository_id,
            &files,
            &symbols,
            &references,
            &build.edges,
        )?;

        stats.files_indexed = stored.files_stored;
        stats.symbols_extracted = symbols.len() as u64;
        stats.references_extracted = references.len() as u64;
        stats.dependencies_extracted = build.edges.len() as u64;
        stats.circular_dependencies = detection.cycles.len() as u64;

        info!(
            "Indexed {} files, {} symbols, {} references, {} dependencies ({} parse failures, {} removed)",
            stats.files_indexed,
            stats.symbols_extracted,
            stats.references_extracted,
            stats.dependencies_extracted,
            stats.parse_failures.len(),
            stored.files_removed
        );
        Ok(stats)
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        let mut builder = rayon::ThreadPoolBuilder::new().stack_size(WORKER_STACK_SIZE);
        if let Some(workers) = self.config.parallel_workers {
            builder = builder.num_threads(workers);
        }
        Ok(builder.build()?)
    }
}

/// Index a repository with the default directory walker
pub fn index_repository(store: &Store, descriptor: &RepositoryDescriptor, config: &IndexConfig) -> Result<IndexStats> {
    Indexer::new(store, config.clone()).index(descriptor)
}
