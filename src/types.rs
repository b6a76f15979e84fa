//! Core type definitions for codeatlas
//!
//! Defines the data model shared by extraction, graph building and storage:
//! - Files: source text and metadata for one indexed file
//! - Symbols: named declarations (functions, classes, interfaces, ...)
//! - References: use-sites (imports, calls, property access, type uses)
//! - Dependency edges: derived file->file and symbol->symbol relationships

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The kind of a declared symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Type,
    Variable,
    Constant,
    Method,
    Property,
    Module,
    Namespace,
    Enum,
    EnumMember,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 12] = [
        SymbolKind::Function,
        SymbolKind::Class,
        SymbolKind::Interface,
        SymbolKind::Type,
        SymbolKind::Variable,
        SymbolKind::Constant,
        SymbolKind::Method,
        SymbolKind::Property,
        SymbolKind::Module,
        SymbolKind::Namespace,
        SymbolKind::Enum,
        SymbolKind::EnumMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Method => "method",
            SymbolKind::Property => "property",
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum_member",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

/// The kind of a use-site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// One imported binding (or re-export / dynamic import)
    Import,
    /// Function, method or constructor call
    Call,
    /// `extends` clause of a class or interface
    Extends,
    /// `implements` clause of a class
    Implements,
    /// Member access that is not the callee of a call
    PropertyAccess,
    /// Type annotation or generic argument
    TypeReference,
    /// Identifier passed as a value
    VariableReference,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 7] = [
        ReferenceKind::Import,
        ReferenceKind::Call,
        ReferenceKind::Extends,
        ReferenceKind::Implements,
        ReferenceKind::PropertyAccess,
        ReferenceKind::TypeReference,
        ReferenceKind::VariableReference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Import => "import",
            ReferenceKind::Call => "call",
            ReferenceKind::Extends => "extends",
            ReferenceKind::Implements => "implements",
            ReferenceKind::PropertyAccess => "property_access",
            ReferenceKind::TypeReference => "type_reference",
            ReferenceKind::VariableReference => "variable_reference",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Kinds that produce symbol-usage edges when their name matches a symbol
    pub fn links_symbols(&self) -> bool {
        matches!(
            self,
            ReferenceKind::Call | ReferenceKind::PropertyAccess | ReferenceKind::TypeReference
        )
    }
}

/// How a binding was imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStyle {
    /// `import { a } from "./x"`
    Named,
    /// `import a from "./x"`
    Default,
    /// `import * as a from "./x"`
    Namespace,
    /// `import "./x"`
    SideEffect,
    /// `import { a as b } from "./x"`
    Aliased,
    /// `import("./x")`
    Dynamic,
}

/// The kind of a derived dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    FileImport,
    SymbolUsage,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::FileImport => "file_import",
            EdgeKind::SymbolUsage => "symbol_usage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "file_import" => Some(EdgeKind::FileImport),
            "symbol_usage" => Some(EdgeKind::SymbolUsage),
            _ => None,
        }
    }
}

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "ts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "jsx" => Language::Jsx,
            _ => Language::Unknown,
        }
    }

    /// Detect the language of a path from its extension
    pub fn from_path(path: &str) -> Self {
        match path.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => {
                Self::from_extension(ext)
            }
            _ => Language::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Jsx => "jsx",
            Language::Unknown => "unknown",
        }
    }

    /// Parse the stored name produced by `as_str`
    pub fn from_name(s: &str) -> Self {
        match s {
            "typescript" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "javascript" => Language::JavaScript,
            "jsx" => Language::Jsx,
            _ => Language::Unknown,
        }
    }
}

/// Direction of a dependency query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Files that import the target
    Dependents,
    /// Files the target imports
    Dependencies,
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Dependents => "dependents",
            Direction::Dependencies => "dependencies",
            Direction::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dependents" => Some(Direction::Dependents),
            "dependencies" => Some(Direction::Dependencies),
            "both" => Some(Direction::Both),
            _ => None,
        }
    }

    pub fn includes_dependents(&self) -> bool {
        matches!(self, Direction::Dependents | Direction::Both)
    }

    pub fn includes_dependencies(&self) -> bool {
        matches!(self, Direction::Dependencies | Direction::Both)
    }
}

/// Describes a repository to index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Canonical unique name, e.g. `acme/web`
    pub full_name: String,
    /// Display name
    pub name: String,
    /// Local checkout to walk
    pub root: PathBuf,
    pub git_url: Option<String>,
    pub default_branch: Option<String>,
}

impl RepositoryDescriptor {
    pub fn new(full_name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .rsplit('/')
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();
        Self {
            full_name,
            name,
            root: root.into(),
            git_url: None,
            default_branch: None,
        }
    }
}

/// A stored repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub git_url: Option<String>,
    pub default_branch: String,
    pub last_indexed_at: Option<i64>,
}

/// One source file as read during an indexing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    pub content: String,
    pub language: Language,
    pub size: u64,
    pub content_hash: String,
    pub indexed_at: i64,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>, indexed_at: i64) -> Self {
        let path = path.into();
        let content = content.into();
        Self {
            language: Language::from_path(&path),
            size: content.len() as u64,
            content_hash: content_hash(&content),
            path,
            content,
            indexed_at,
        }
    }
}

/// SHA-256 of text, hex encoded
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Natural identity of a symbol: `(file_path, name, line_start)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolKey {
    pub file_path: String,
    pub name: String,
    pub line_start: u32,
}

/// A named declaration inside a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub file_path: String,
    pub name: String,
    pub kind: SymbolKind,
    pub line_start: u32,
    pub line_end: u32,
    pub signature: Option<String>,
    pub documentation: Option<String>,
    pub is_exported: bool,
}

impl Symbol {
    pub fn key(&self) -> SymbolKey {
        SymbolKey {
            file_path: self.file_path.clone(),
            name: self.name.clone(),
            line_start: self.line_start,
        }
    }
}

/// The declaration a reference occurs inside of
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnclosingSymbol {
    pub name: String,
    pub line: u32,
}

/// Extra facts about a reference; stored as JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMetadata {
    /// Raw import specifier, input to import resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_style: Option<ImportStyle>,
    /// Local name for aliased and namespace imports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_method_call: bool,
    /// Receiver text for method calls and property access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional_chain: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub constructor: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dynamic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<EnclosingSymbol>,
}

/// A use-site inside a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub file_path: String,
    /// Referenced symbol name
    pub name: String,
    pub kind: ReferenceKind,
    pub line: u32,
    pub column: u32,
    /// Resolved file for import references
    pub target_file_path: Option<String>,
    /// Resolved declaration, if linking found exactly one
    pub target_symbol: Option<SymbolKey>,
    pub metadata: ReferenceMetadata,
}

impl Reference {
    pub fn new(file_path: &str, name: impl Into<String>, kind: ReferenceKind, line: u32, column: u32) -> Self {
        Self {
            file_path: file_path.to_string(),
            name: name.into(),
            kind,
            line,
            column,
            target_file_path: None,
            target_symbol: None,
            metadata: ReferenceMetadata::default(),
        }
    }

    /// The symbol this reference occurs inside of, if any
    pub fn enclosing_key(&self) -> Option<SymbolKey> {
        self.metadata.enclosing.as_ref().map(|e| SymbolKey {
            file_path: self.file_path.clone(),
            name: e.name.clone(),
            line_start: e.line,
        })
    }
}

/// A derived directed edge between two files or two symbols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub repository_id: String,
    pub kind: EdgeKind,
    pub from_file: Option<String>,
    pub to_file: Option<String>,
    pub from_symbol: Option<SymbolKey>,
    pub to_symbol: Option<SymbolKey>,
}

impl DependencyEdge {
    pub fn file_import(repository_id: &str, from: &str, to: &str) -> Self {
        Self {
            repository_id: repository_id.to_string(),
            kind: EdgeKind::FileImport,
            from_file: Some(from.to_string()),
            to_file: Some(to.to_string()),
            from_symbol: None,
            to_symbol: None,
        }
    }

    /// At least one of the file pair or the symbol pair is fully populated
    pub fn is_well_formed(&self) -> bool {
        (self.from_file.is_some() && self.to_file.is_some())
            || (self.from_symbol.is_some() && self.to_symbol.is_some())
    }

    /// Stable identity used for deduplication and sync upserts
    pub fn edge_key(&self) -> String {
        fn sym(key: &Option<SymbolKey>) -> String {
            key.as_ref()
                .map(|k| format!("{}#{}@{}", k.file_path, k.name, k.line_start))
                .unwrap_or_default()
        }
        format!(
            "{}|{}|{}|{}|{}",
            self.kind.as_str(),
            self.from_file.as_deref().unwrap_or(""),
            self.to_file.as_deref().unwrap_or(""),
            sym(&self.from_symbol),
            sym(&self.to_symbol),
        )
    }
}

/// A closed loop of file paths: `[a, b, c]` means a -> b -> c -> a
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cycle(pub Vec<String>);

impl Cycle {
    /// Rotate so the lexicographically smallest path comes first
    pub fn normalized(mut nodes: Vec<String>) -> Self {
        if let Some(min_idx) = nodes
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(idx, _)| idx)
        {
            nodes.rotate_left(min_idx);
        }
        Cycle(nodes)
    }

    pub fn nodes(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }
}

/// A file whose syntax tree could not be built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub path: String,
    pub message: String,
}

/// Statistics from an indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_indexed: u64,
    pub symbols_extracted: u64,
    pub references_extracted: u64,
    pub dependencies_extracted: u64,
    pub circular_dependencies: u64,
    /// Files that could not be read from disk
    pub read_errors: u64,
    pub parse_failures: Vec<ParseFailure>,
}

/// Row counts written by one storage transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageResult {
    pub files_stored: u64,
    pub files_removed: u64,
    pub symbols_stored: u64,
    pub references_stored: u64,
    pub edges_stored: u64,
}

/// A full-text search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub repository: String,
    pub path: String,
    /// Window around the best match with `<mark>` highlights
    pub snippet: String,
    /// Relevance; higher is better
    pub score: f64,
    /// Files this file imports
    pub dependencies: Vec<String>,
    pub indexed_at: i64,
}

/// Metadata about a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: String,
    pub repository: String,
    pub path: String,
    pub language: Language,
    pub size: u64,
    pub content_hash: String,
    pub indexed_at: i64,
}

/// Files reached at one traversal depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLevel {
    pub depth: u32,
    pub files: Vec<String>,
}

/// Result of a bounded dependency traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyResult {
    pub file_path: String,
    pub repository: Option<String>,
    pub direction: Direction,
    pub depth: u32,
    /// Files importing the target, grouped by depth (depth 1 = direct)
    pub dependents: Vec<DependencyLevel>,
    /// Files the target imports, grouped by depth (depth 1 = direct)
    pub dependencies: Vec<DependencyLevel>,
    pub cycles: Vec<Cycle>,
    /// True when the depth bound cut off unexplored edges
    pub depth_limited: bool,
}

impl DependencyResult {
    pub fn empty(file_path: &str, direction: Direction, depth: u32) -> Self {
        Self {
            file_path: file_path.to_string(),
            repository: None,
            direction,
            depth,
            dependents: Vec::new(),
            dependencies: Vec::new(),
            cycles: Vec::new(),
            depth_limited: false,
        }
    }

    pub fn direct_dependents(&self) -> &[String] {
        level_files(&self.dependents, 1)
    }

    pub fn indirect_dependents(&self) -> Vec<&String> {
        indirect_files(&self.dependents)
    }

    pub fn direct_dependencies(&self) -> &[String] {
        level_files(&self.dependencies, 1)
    }

    pub fn indirect_dependencies(&self) -> Vec<&String> {
        indirect_files(&self.dependencies)
    }
}

fn level_files(levels: &[DependencyLevel], depth: u32) -> &[String] {
    levels
        .iter()
        .find(|l| l.depth == depth)
        .map(|l| l.files.as_slice())
        .unwrap_or(&[])
}

fn indirect_files(levels: &[DependencyLevel]) -> Vec<&String> {
    levels
        .iter()
        .filter(|l| l.depth > 1)
        .flat_map(|l| l.files.iter())
        .collect()
}

/// A user-defined grouping of repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    /// Full names of member repositories
    pub repositories: Vec<String>,
}

/// Store-wide statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_repositories: u64,
    pub total_files: u64,
    pub total_symbols: u64,
    pub total_references: u64,
    pub total_edges: u64,
    pub db_size_bytes: u64,
    pub languages: Vec<(Language, u64)>,
    pub symbol_kinds: Vec<(SymbolKind, u64)>,
}
