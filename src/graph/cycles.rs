//! Circular dependency detection over the file-import subgraph
//!
//! Depth-first search with an explicit path stack. Each cycle is reported
//! once, rotated so its smallest path comes first. A search only starts from
//! the smallest node of a prospective cycle, so rotations are never
//! rediscovered. Paths longer than the depth bound are cut off and flagged.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::types::{Cycle, DependencyEdge, EdgeKind};

/// Adjacency lists keyed by file path
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Default bound on the number of files in a reported cycle
pub const DEFAULT_CYCLE_DEPTH: usize = 5;

/// Cycles found plus whether the depth bound truncated the search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleDetection {
    pub cycles: Vec<Cycle>,
    pub depth_limited: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CycleDetector {
    max_depth: usize,
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_DEPTH)
    }
}

impl CycleDetector {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    /// Detect cycles among the `file_import` edges
    pub fn detect(&self, edges: &[DependencyEdge]) -> CycleDetection {
        let mut adjacency = Adjacency::new();
        for edge in edges.iter().filter(|e| e.kind == EdgeKind::FileImport) {
            if let (Some(from), Some(to)) = (&edge.from_file, &edge.to_file) {
                adjacency.entry(from.clone()).or_default().insert(to.clone());
            }
        }
        self.detect_in(&adjacency)
    }

    pub fn detect_in(&self, adjacency: &Adjacency) -> CycleDetection {
        let mut search = Search {
            adjacency,
            max_depth: self.max_depth,
            path: Vec::new(),
            on_path: BTreeSet::new(),
            found: BTreeSet::new(),
            depth_limited: false,
        };

        for start in adjacency.keys() {
            search.path.push(start);
            search.on_path.insert(start);
            search.explore(start, start);
            search.on_path.remove(start.as_str());
            search.path.pop();
        }

        if search.depth_limited {
            debug!("Cycle search truncated at depth {}", self.max_depth);
        }
        CycleDetection {
            cycles: search.found.into_iter().collect(),
            depth_limited: search.depth_limited,
        }
    }
}

struct Search<'g> {
    adjacency: &'g Adjacency,
    max_depth: usize,
    path: Vec<&'g str>,
    on_path: BTreeSet<&'g str>,
    found: BTreeSet<Cycle>,
    depth_limited: bool,
}

impl<'g> Search<'g> {
    fn explore(&mut self, start: &'g str, node: &'g str) {
        let adjacency = self.adjacency;
        let Some(targets) = adjacency.get(node) else {
            return;
        };
        for next in targets {
            let next = next.as_str();
            if next == start {
                let nodes = self.path.iter().map(|p| p.to_string()).collect();
                self.found.insert(Cycle::normalized(nodes));
                continue;
            }
            // Nodes below `start` belong to cycles found from a smaller start
            if next < start || self.on_path.contains(next) {
                continue;
            }
            if self.path.len() >= self.max_depth {
                self.depth_limited = true;
                continue;
            }
            self.path.push(next);
            self.on_path.insert(next);
            self.explore(start, next);
            self.on_path.remove(next);
            self.path.pop();
        }
    }
}

/// Detect cycles with the default depth bound
pub fn detect_cycles(edges: &[DependencyEdge]) -> Vec<Cycle> {
    CycleDetector::default().detect(edges).cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> Vec<DependencyEdge> {
        pairs
            .iter()
            .map(|(a, b)| DependencyEdge::file_import("repo", a, b))
            .collect()
    }

    #[test]
    fn test_simple_cycle() {
        let cycles = detect_cycles(&edges(&[("A", "B"), ("B", "C"), ("C", "A")]));
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes(), ["A", "B", "C"]);
    }

    #[test]
    fn test_cycle_independent_of_start() {
        // Same cycle, edges listed from a different node
        let a = detect_cycles(&edges(&[("C", "A"), ("A", "B"), ("B", "C")]));
        let b = detect_cycles(&edges(&[("B", "C"), ("C", "A"), ("A", "B")]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        for node in ["A", "B", "C"] {
            assert!(a[0].contains(node));
        }
    }

    #[test]
    fn test_no_cycles() {
        let cycles = detect_cycles(&edges(&[("A", "B"), ("B", "C"), ("A", "C")]));
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_self_import() {
        let cycles = detect_cycles(&edges(&[("A", "A")]));
        assert_eq!(cycles, vec![Cycle(vec!["A".to_string()])]);
    }

    #[test]
    fn test_two_cycles_sharing_node() {
        let cycles = detect_cycles(&edges(&[("A", "B"), ("B", "A"), ("B", "C"), ("C", "B")]));
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].nodes(), ["A", "B"]);
        assert_eq!(cycles[1].nodes(), ["B", "C"]);
    }

    #[test]
    fn test_depth_bound() {
        let chain = edges(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);
        let detection = CycleDetector::new(3).detect(&chain);
        assert!(detection.cycles.is_empty());
        assert!(detection.depth_limited);

        let detection = CycleDetector::new(4).detect(&chain);
        assert_eq!(detection.cycles.len(), 1);
        assert!(!detection.depth_limited);
    }

    #[test]
    fn test_symbol_edges_ignored() {
        let mut edge = DependencyEdge::file_import("repo", "A", "B");
        edge.kind = EdgeKind::SymbolUsage;
        let mut back = DependencyEdge::file_import("repo", "B", "A");
        back.kind = EdgeKind::SymbolUsage;
        assert!(detect_cycles(&[edge, back]).is_empty());
    }
}
