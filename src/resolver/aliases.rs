//! tsconfig-style path aliases
//!
//! Reads `compilerOptions.baseUrl` and `compilerOptions.paths` from the
//! repository's `tsconfig.json` and rewrites matching bare specifiers into
//! relative specifiers that the resolver understands.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use super::{join_relative, relative_specifier};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}

/// One `paths` entry, split around its optional `*`
#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasPattern {
    prefix: String,
    suffix: Option<String>,
    targets: Vec<String>,
}

impl AliasPattern {
    /// The text matched by `*`, or "" for exact patterns
    fn matches<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        match &self.suffix {
            None => (specifier == self.prefix).then_some(""),
            Some(suffix) => specifier
                .strip_prefix(self.prefix.as_str())?
                .strip_suffix(suffix.as_str()),
        }
    }
}

/// Path alias table; empty when no usable tsconfig exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathAliases {
    /// Root-relative directory `paths` and bare specifiers resolve against
    base_url: Option<String>,
    patterns: Vec<AliasPattern>,
}

impl PathAliases {
    /// Load from `<root>/tsconfig.json`; unreadable or unparseable files yield no aliases
    pub fn load(root: &Path) -> Self {
        let path = root.join("tsconfig.json");
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match Self::from_json(&text) {
            Ok(aliases) => aliases,
            Err(err) => {
                warn!("Ignoring path aliases in {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Parse tsconfig text; comments and trailing commas are accepted
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let config: TsConfig = serde_json::from_str(&strip_jsonc(text))?;
        let Some(options) = config.compiler_options else {
            return Ok(Self::default());
        };

        let base_url = options
            .base_url
            .as_deref()
            .and_then(|b| join_relative("", b));
        let mut patterns: Vec<AliasPattern> = options
            .paths
            .into_iter()
            .map(|(pattern, targets)| match pattern.split_once('*') {
                Some((prefix, suffix)) => AliasPattern {
                    prefix: prefix.to_string(),
                    suffix: Some(suffix.to_string()),
                    targets,
                },
                None => AliasPattern {
                    prefix: pattern,
                    suffix: None,
                    targets,
                },
            })
            .collect();
        // Longest prefix wins, as in the TypeScript compiler
        patterns.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Ok(Self { base_url, patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.base_url.is_none() && self.patterns.is_empty()
    }

    /// Candidate relative specifiers for a bare `specifier`, in priority order
    pub fn rewrite(&self, specifier: &str, from_file: &str) -> Vec<String> {
        let base = self.base_url.as_deref().unwrap_or("");
        let mut candidates = Vec::new();

        if let Some((pattern, matched)) = self
            .patterns
            .iter()
            .find_map(|p| p.matches(specifier).map(|m| (p, m)))
        {
            for target in &pattern.targets {
                let substituted = target.replacen('*', matched, 1);
                if let Some(path) = join_relative(base, &substituted) {
                    candidates.push(relative_specifier(from_file, &path));
                }
            }
        }

        if self.base_url.is_some() {
            if let Some(path) = join_relative(base, specifier) {
                candidates.push(relative_specifier(from_file, &path));
            }
        }

        candidates
    }
}

/// Drop `//` and `/* */` comments and trailing commas outside string literals
fn strip_jsonc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            '}' | ']' => {
                let kept = out.trim_end().len();
                if out[..kept].ends_with(',') {
                    out.truncate(kept - 1);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
