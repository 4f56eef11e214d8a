//! DependencyGraph and the Topological Sorter (§3, §4.3).

use crate::error::{FortunaError, Result};
use crate::source::SourceFile;

/// Directed graph over [`SourceFile`] indices. Forward edges mean "depends on"; a
/// reverse adjacency list is built alongside so the planner can walk "is depended upon by"
/// without re-deriving it on every query.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    files: &'a [SourceFile],
    /// `reverse[i]` holds every `j` such that `files[j]` depends on `files[i]`.
    reverse: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(files: &'a [SourceFile]) -> Self {
        let mut reverse = vec![Vec::new(); files.len()];
        for (i, file) in files.iter().enumerate() {
            for &dep in &file.dependencies {
                reverse[dep].push(i);
            }
        }
        Self { files, reverse }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file(&self, idx: usize) -> &SourceFile {
        &self.files[idx]
    }

    /// Every index that directly depends on `idx` (the reverse-edge neighbours).
    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        &self.reverse[idx]
    }

    /// Kahn's algorithm. FIFO tie-break on ties, so a stable scan yields a stable order.
    /// Returns [`FortunaError::CycleDetected`] if not every node was emitted.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let n = self.files.len();
        let mut indegree: Vec<usize> = self.files.iter().map(|f| f.dependencies.len()).collect();
        let mut queue: std::collections::VecDeque<usize> =
            (0..n).filter(|&i| indegree[i] == 0).collect();

        let mut order = Vec::with_capacity(n);
        while let Some(u) = queue.pop_front() {
            order.push(u);
            for &v in &self.reverse[u] {
                indegree[v] -= 1;
                if indegree[v] == 0 {
                    queue.push_back(v);
                }
            }
        }

        if order.len() < n {
            return Err(FortunaError::CycleDetected);
        }
        Ok(order)
    }

    /// Splits the full topological order into waves where every source in a wave has
    /// no dependency also present in that wave or a later one — i.e. each wave is safe
    /// to compile concurrently once every earlier wave has completed. Used on a cold
    /// cache so Fortran module artifacts exist before their dependents compile (§4.7, §9).
    pub fn topological_layers(&self) -> Result<Vec<Vec<usize>>> {
        let n = self.files.len();
        let mut indegree: Vec<usize> = self.files.iter().map(|f| f.dependencies.len()).collect();
        let mut remaining = n;
        let mut layers = Vec::new();

        let mut frontier: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        while !frontier.is_empty() {
            remaining -= frontier.len();
            let mut next = Vec::new();
            for &u in &frontier {
                for &v in &self.reverse[u] {
                    indegree[v] -= 1;
                    if indegree[v] == 0 {
                        next.push(v);
                    }
                }
            }
            layers.push(std::mem::take(&mut frontier));
            frontier = next;
        }

        if remaining > 0 {
            return Err(FortunaError::CycleDetected);
        }
        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn file(path: &str, deps: &[usize]) -> SourceFile {
        let mut f = SourceFile::new(PathBuf::from(path), SourceKind::Fortran);
        f.dependencies = deps.to_vec();
        f
    }

    #[test]
    fn linear_chain_orders_dependencies_first() {
        // a defines alpha; b uses alpha -> b depends on a (index 0).
        let files = vec![file("a.f90", &[]), file("b.f90", &[0])];
        let graph = DependencyGraph::new(&files);
        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn three_file_chain() {
        let files = vec![file("a", &[]), file("b", &[0]), file("c", &[1])];
        let graph = DependencyGraph::new(&files);
        assert_eq!(graph.topological_order().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn cycle_is_detected() {
        // a depends on b, b depends on a.
        let files = vec![file("a", &[1]), file("b", &[0])];
        let graph = DependencyGraph::new(&files);
        assert!(matches!(graph.topological_order(), Err(FortunaError::CycleDetected)));
    }

    #[test]
    fn order_respects_transitive_dependency_property() {
        let files = vec![
            file("a", &[]),
            file("b", &[0]),
            file("c", &[1]),
            file("d", &[]),
            file("e", &[3, 2]),
        ];
        let graph = DependencyGraph::new(&files);
        let order = graph.topological_order().unwrap();
        let pos = |i: usize| order.iter().position(|&x| x == i).unwrap();
        assert!(pos(0) < pos(1));
        assert!(pos(1) < pos(2));
        assert!(pos(3) < pos(4));
        assert!(pos(2) < pos(4));
    }

    #[test]
    fn layers_group_mutually_independent_sources() {
        let files = vec![file("a", &[]), file("b", &[]), file("c", &[0, 1])];
        let graph = DependencyGraph::new(&files);
        let layers = graph.topological_layers().unwrap();
        assert_eq!(layers.len(), 2);
        let mut first = layers[0].clone();
        first.sort_unstable();
        assert_eq!(first, vec![0, 1]);
        assert_eq!(layers[1], vec![2]);
    }
}
