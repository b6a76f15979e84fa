//! Import resolution
//!
//! Maps a raw import specifier plus the importing file to a file in the
//! indexed set. Only relative specifiers resolve; bare package names,
//! absolute paths and dynamic imports are external and yield `None`.
//! Path aliases (tsconfig `paths`/`baseUrl`) rewrite bare specifiers into
//! relative ones before resolution.

mod aliases;

pub use aliases::PathAliases;

use std::collections::HashSet;

use crate::extraction::SUPPORTED_EXTENSIONS;
use crate::types::{Reference, ReferenceKind};

/// Resolve a relative specifier against the set of known files
pub fn resolve_import(specifier: &str, from_file: &str, known_files: &HashSet<String>) -> Option<String> {
    if !is_relative(specifier) {
        return None;
    }

    let base = join_relative(parent_dir(from_file), specifier)?;

    // 1. Exact match with a supported extension
    if has_supported_extension(&base) && known_files.contains(&base) {
        return Some(base);
    }

    // 2. Append each extension in priority order
    if !base.is_empty() {
        for ext in SUPPORTED_EXTENSIONS {
            let candidate = format!("{}.{}", base, ext);
            if known_files.contains(&candidate) {
                return Some(candidate);
            }
        }
    }

    // 3. Directory index files
    for ext in SUPPORTED_EXTENSIONS {
        let candidate = if base.is_empty() {
            format!("index.{}", ext)
        } else {
            format!("{}/index.{}", base, ext)
        };
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// `./x`, `../x`, `.` and `..`
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
}

fn has_supported_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.contains('/') && SUPPORTED_EXTENSIONS.contains(&ext))
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Join `specifier` onto `dir`, folding `.` and `..`; `None` if it escapes the root
fn join_relative(dir: &str, specifier: &str) -> Option<String> {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in specifier.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Relative specifier leading from the directory of `from_file` to `target`
pub fn relative_specifier(from_file: &str, target: &str) -> String {
    let from: Vec<&str> = parent_dir(from_file).split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let ups = from.len() - common;

    let mut spec = if ups == 0 {
        String::from(".")
    } else {
        vec![".."; ups].join("/")
    };
    for segment in &to[common..] {
        spec.push('/');
        spec.push_str(segment);
    }
    spec
}

/// Resolves import references for one repository
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    known_files: HashSet<String>,
    aliases: PathAliases,
}

impl ImportResolver {
    pub fn new(known_files: HashSet<String>) -> Self {
        Self {
            known_files,
            aliases: PathAliases::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: PathAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn resolve(&self, specifier: &str, from_file: &str) -> Option<String> {
        if is_relative(specifier) {
            return resolve_import(specifier, from_file, &self.known_files);
        }
        self.aliases
            .rewrite(specifier, from_file)
            .into_iter()
            .find_map(|rewritten| resolve_import(&rewritten, from_file, &self.known_files))
    }

    /// Fill `target_file_path` on static import references; returns how many resolved
    pub fn resolve_references(&self, references: &mut [Reference]) -> usize {
        let mut resolved = 0;
        for reference in references.iter_mut() {
            if reference.kind != ReferenceKind::Import || reference.metadata.dynamic {
                continue;
            }
            let Some(specifier) = reference.metadata.import_source.as_deref() else {
                continue;
            };
            reference.target_file_path = self.resolve(specifier, &reference.file_path);
            if reference.target_file_path.is_some() {
                resolved += 1;
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImportStyle, ReferenceMetadata};

    fn known(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_resolve_sibling() {
        let files = known(&["a.ts", "b.ts"]);
        assert_eq!(resolve_import("./b", "a.ts", &files), Some("b.ts".to_string()));
    }

    #[test]
    fn test_bare_and_scoped_specifiers() {
        let files = known(&["a.ts", "react.ts"]);
        assert_eq!(resolve_import("react", "a.ts", &files), None);
        assert_eq!(resolve_import("@pkg/x", "a.ts", &files), None);
        assert_eq!(resolve_import("/abs/path", "a.ts", &files), None);
    }

    #[test]
    fn test_exact_extension() {
        let files = known(&["src/a.ts", "src/b.js", "src/b.js.ts"]);
        assert_eq!(resolve_import("./b.js", "src/a.ts", &files), Some("src/b.js".to_string()));
    }

    #[test]
    fn test_extension_priority() {
        let files = known(&["src/a.ts", "src/util.js", "src/util.ts", "src/util.tsx"]);
        assert_eq!(resolve_import("./util", "src/a.ts", &files), Some("src/util.ts".to_string()));

        let files = known(&["src/a.ts", "src/util.jsx", "src/util.js"]);
        assert_eq!(resolve_import("./util", "src/a.ts", &files), Some("src/util.js".to_string()));
    }

    #[test]
    fn test_directory_index() {
        let files = known(&["src/app.ts", "src/components/index.tsx", "src/components/index.js"]);
        assert_eq!(
            resolve_import("./components", "src/app.ts", &files),
            Some("src/components/index.tsx".to_string())
        );
        let files = known(&["src/lib/a.ts", "src/index.ts"]);
        assert_eq!(resolve_import("..", "src/lib/a.ts", &files), Some("src/index.ts".to_string()));
    }

    #[test]
    fn test_parent_directories() {
        let files = known(&["src/lib/a.ts", "src/shared/b.ts"]);
        assert_eq!(
            resolve_import("../shared/b", "src/lib/a.ts", &files),
            Some("src/shared/b.ts".to_string())
        );
        assert_eq!(resolve_import("../../../b", "src/lib/a.ts", &files), None);
    }

    #[test]
    fn test_unresolved() {
        let files = known(&["a.ts"]);
        assert_eq!(resolve_import("./missing", "a.ts", &files), None);
    }

    #[test]
    fn test_relative_specifier() {
        assert_eq!(relative_specifier("src/app/main.ts", "src/lib/util"), "../lib/util");
        assert_eq!(relative_specifier("main.ts", "src/util"), "./src/util");
        assert_eq!(relative_specifier("src/a.ts", "src/b"), "./b");
    }

    #[test]
    fn test_resolve_references_skips_dynamic() {
        let resolver = ImportResolver::new(known(&["a.ts", "b.ts"]));
        let mut static_ref = Reference::new("a.ts", "b", ReferenceKind::Import, 1, 0);
        static_ref.metadata = ReferenceMetadata {
            import_source: Some("./b".to_string()),
            import_style: Some(ImportStyle::Named),
            ..Default::default()
        };
        let mut dynamic_ref = Reference::new("a.ts", "./b", ReferenceKind::Import, 2, 0);
        dynamic_ref.metadata = ReferenceMetadata {
            import_source: Some("./b".to_string()),
            import_style: Some(ImportStyle::Dynamic),
            dynamic: true,
            ..Default::default()
        };
        let mut refs = vec![static_ref, dynamic_ref];
        assert_eq!(resolver.resolve_references(&mut refs), 1);
        assert_eq!(refs[0].target_file_path.as_deref(), Some("b.ts"));
        assert!(refs[1].target_file_path.is_none());
    }
}
