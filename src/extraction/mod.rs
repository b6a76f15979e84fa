//! Code extraction module
//!
//! Uses tree-sitter to parse TypeScript and JavaScript sources and extract:
//! - Symbols (functions, classes, interfaces, methods, enums, ...)
//! - References (imports, calls, property access, type references, heritage)
//!
//! Each file is handled independently so callers can fan out across threads
//! with one `Extractor` per worker.

mod languages;
mod parser;
mod references;
mod symbols;
mod syntax;

pub use languages::{is_supported_extension, SUPPORTED_EXTENSIONS};
pub use parser::{Comment, ParsedSource, SourceParser};
pub use references::extract_references;
pub use symbols::extract_symbols;

use crate::types::{EnclosingSymbol, ParseFailure, Reference, Symbol};

/// Symbols and references extracted from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileExtraction {
    pub symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
}

/// Extracts symbols and references from source files
pub struct Extractor {
    parser: SourceParser,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            parser: SourceParser::new(),
        }
    }

    /// Parse `content` and run both extraction passes over the tree
    pub fn extract_file(&mut self, path: &str, content: &str) -> Result<FileExtraction, ParseFailure> {
        let parsed = self.parser.parse(path, content)?;
        let symbols = extract_symbols(&parsed);
        let mut references = extract_references(&parsed);
        assign_enclosing(&symbols, &mut references);
        Ok(FileExtraction {
            symbols,
            references,
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Record the innermost symbol whose line range contains each reference
fn assign_enclosing(symbols: &[Symbol], references: &mut [Reference]) {
    for reference in references.iter_mut() {
        let innermost = symbols
            .iter()
            .filter(|s| s.line_start <= reference.line && reference.line <= s.line_end)
            .min_by_key(|s| (s.line_end - s.line_start, std::cmp::Reverse(s.line_start)));
        reference.metadata.enclosing = innermost.map(|s| EnclosingSymbol {
            name: s.name.clone(),
            line: s.line_start,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReferenceKind, SymbolKind};

    #[test]
    fn test_extractor_creation() {
        let extractor = Extractor::new();
        assert!(std::mem::size_of_val(&extractor) > 0);
    }

    #[test]
    fn test_extract_unsupported_extension() {
        let mut extractor = Extractor::new();
        let err = extractor.extract_file("test.xyz", "some content").unwrap_err();
        assert_eq!(err.path, "test.xyz");
    }

    #[test]
    fn test_extract_invalid_file() {
        let mut extractor = Extractor::new();
        let err = extractor
            .extract_file("bad.ts", "export function ( {")
            .unwrap_err();
        assert_eq!(err.path, "bad.ts");
    }

    #[test]
    fn test_extract_empty_file() {
        let mut extractor = Extractor::new();
        let result = extractor.extract_file("empty.ts", "").unwrap();
        assert!(result.symbols.is_empty());
        assert!(result.references.is_empty());
    }

    #[test]
    fn test_util_and_main() {
        let mut extractor = Extractor::new();
        let util = extractor
            .extract_file("util.ts", "export function add(a: number, b: number) { return a + b; }\n")
            .unwrap();
        assert_eq!(util.symbols.len(), 1);
        assert_eq!(util.symbols[0].kind, SymbolKind::Function);

        let main = extractor
            .extract_file("main.ts", "import {add} from \"./util\"; add(1,2)\n")
            .unwrap();
        assert!(main.symbols.is_empty());
        assert_eq!(main.references.len(), 2);
        assert_eq!(main.references[0].kind, ReferenceKind::Import);
        assert_eq!(main.references[1].kind, ReferenceKind::Call);
    }

    #[test]
    fn test_enclosing_symbol() {
        let code = r#"
export class Service {
    run() {
        helper();
    }
}

function helper() {
    console.log("x");
}

helper();
"#;
        let mut extractor = Extractor::new();
        let result = extractor.extract_file("svc.ts", code).unwrap();
        let calls: Vec<_> = result
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Call)
            .collect();
        assert_eq!(calls.len(), 3);

        let in_run = calls[0].metadata.enclosing.as_ref().unwrap();
        assert_eq!(in_run.name, "run");
        assert_eq!(in_run.line, 3);

        let in_helper = calls[1].metadata.enclosing.as_ref().unwrap();
        assert_eq!(in_helper.name, "helper");

        assert!(calls[2].metadata.enclosing.is_none());
    }

    #[test]
    fn test_line_numbers() {
        let mut extractor = Extractor::new();
        let code = "function first() {}\n\nfunction second() {}\n\nfunction third() {}\n";
        let result = extractor.extract_file("lines.js", code).unwrap();
        let lines: Vec<_> = result.symbols.iter().map(|s| s.line_start).collect();
        assert_eq!(lines, vec![1, 3, 5]);
    }
}
