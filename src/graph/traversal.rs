//! Bounded breadth-first traversal over file-import adjacency

use std::collections::{BTreeSet, HashSet};

use super::cycles::Adjacency;
use crate::types::DependencyLevel;

/// Files reached from a start file, grouped by depth
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    pub levels: Vec<DependencyLevel>,
    /// Every edge followed or seen while expanding, as `(from, to)` in adjacency order
    pub edges: Vec<(String, String)>,
    /// Unexplored edges remained past the last level
    pub depth_limited: bool,
}

/// Heuristic test-file detection by path
pub fn is_test_file(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.contains(".test.")
        || name.contains(".spec.")
        || path
            .split('/')
            .rev()
            .skip(1)
            .any(|dir| dir == "__tests__" || dir == "test" || dir == "tests")
}

/// Walk `adjacency` from `start` up to `depth` levels. Nodes are expanded at
/// most once; with `include_tests == false` test files are neither reported
/// nor expanded.
pub fn traverse(adjacency: &Adjacency, start: &str, depth: u32, include_tests: bool) -> Traversal {
    let mut traversal = Traversal::default();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(start);

    let mut frontier: Vec<&str> = vec![start];
    for level in 1..=depth {
        let mut next_level: BTreeSet<&str> = BTreeSet::new();
        for &node in &frontier {
            let Some(targets) = adjacency.get(node) else {
                continue;
            };
            for target in targets {
                if !include_tests && is_test_file(target) {
                    continue;
                }
                traversal.edges.push((node.to_string(), target.clone()));
                if visited.insert(target.as_str()) {
                    next_level.insert(target.as_str());
                }
            }
        }
        if next_level.is_empty() {
            return traversal;
        }
        traversal.levels.push(DependencyLevel {
            depth: level,
            files: next_level.iter().map(|s| s.to_string()).collect(),
        });
        frontier = next_level.into_iter().collect();
    }

    // Anything new one step further means the bound cut the walk short
    traversal.depth_limited = frontier.iter().any(|&node| {
        adjacency.get(node).is_some_and(|targets| {
            targets
                .iter()
                .any(|t| !visited.contains(t.as_str()) && (include_tests || !is_test_file(t)))
        })
    });
    traversal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(pairs: &[(&str, &str)]) -> Adjacency {
        let mut adj = Adjacency::new();
        for (a, b) in pairs {
            adj.entry(a.to_string()).or_default().insert(b.to_string());
        }
        adj
    }

    #[test]
    fn test_levels() {
        let adj = adjacency(&[("t", "a"), ("t", "b"), ("a", "c"), ("c", "d")]);
        let result = traverse(&adj, "t", 2, true);
        assert_eq!(result.levels.len(), 2);
        assert_eq!(result.levels[0].files, vec!["a", "b"]);
        assert_eq!(result.levels[1].files, vec!["c"]);
        assert!(result.depth_limited);

        let full = traverse(&adj, "t", 5, true);
        assert_eq!(full.levels.len(), 3);
        assert!(!full.depth_limited);
    }

    #[test]
    fn test_cycle_safe() {
        let adj = adjacency(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let result = traverse(&adj, "a", 5, true);
        assert_eq!(result.levels.len(), 2);
        assert!(result.levels.iter().all(|l| !l.files.contains(&"a".to_string())));
        assert!(result.edges.contains(&("c".to_string(), "a".to_string())));
    }

    #[test]
    fn test_excludes_tests() {
        let adj = adjacency(&[("t", "a.test.ts"), ("t", "b.ts"), ("a.test.ts", "c.ts")]);
        let result = traverse(&adj, "t", 3, false);
        assert_eq!(result.levels.len(), 1);
        assert_eq!(result.levels[0].files, vec!["b.ts"]);

        let with_tests = traverse(&adj, "t", 3, true);
        assert_eq!(with_tests.levels.len(), 2);
    }

    #[test]
    fn test_unknown_start() {
        let result = traverse(&Adjacency::new(), "missing.ts", 3, true);
        assert!(result.levels.is_empty());
        assert!(!result.depth_limited);
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file("src/util.test.ts"));
        assert!(is_test_file("src/util.spec.js"));
        assert!(is_test_file("src/__tests__/util.ts"));
        assert!(is_test_file("tests/helpers.ts"));
        assert!(is_test_file("packages/core/test/setup.ts"));
        assert!(!is_test_file("src/testing.ts"));
        assert!(!is_test_file("src/contest/util.ts"));
        assert!(!is_test_file("test.ts"));
    }
}
