//! Rebuild Planner: reverse-reachability closure over changed and missing files (§4.6).

use crate::cache::PrevHashTable;
use crate::graph::DependencyGraph;
use crate::hash::fingerprint;
use crate::source::SourceKind;
use std::collections::HashSet;
use std::path::Path;

/// The minimal ordered set of sources a build must recompile, plus whether a full
/// executable link and/or archive step is required.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Restriction of the graph's topological order to the files that must recompile.
    pub rebuild: Vec<usize>,
    pub link_required: bool,
    pub archive_required: bool,
}

impl BuildPlan {
    pub fn nothing_to_build(&self) -> bool {
        self.rebuild.is_empty() && !self.archive_required
    }
}

/// Computes the [`BuildPlan`] per §4.6. `mod_dir` is checked for each Fortran module's
/// expected artifact (`{mod_dir}/{module}.mod`, the `gfortran` convention); `obj_dir` is
/// used only for the object-count consistency guard.
pub struct PlannerInputs<'a> {
    pub graph: &'a DependencyGraph<'a>,
    pub order: &'a [usize],
    pub prev_hashes: &'a PrevHashTable,
    pub mod_dir: &'a Path,
    pub obj_dir: &'a Path,
    pub force_full: bool,
    pub link_required: bool,
    pub archive_required: bool,
}

pub fn plan(inputs: PlannerInputs<'_>) -> BuildPlan {
    let PlannerInputs {
        graph,
        order,
        prev_hashes,
        mod_dir,
        obj_dir,
        force_full,
        link_required,
        archive_required,
    } = inputs;

    if force_full || cache_is_inconsistent(graph, obj_dir) {
        return BuildPlan { rebuild: order.to_vec(), link_required, archive_required };
    }

    let mut seeds: HashSet<usize> = HashSet::new();
    for i in 0..graph.len() {
        let file = graph.file(i);
        let current = fingerprint(&file.path);
        match prev_hashes.get(&file.path) {
            Some(prev) if prev == current => {}
            _ => {
                seeds.insert(i);
            }
        }
        if missing_module_artifact(file, mod_dir) {
            seeds.insert(i);
        }
    }

    let mut rebuild_set: HashSet<usize> = HashSet::new();
    for &seed in &seeds {
        collect_reverse_reachable(graph, seed, &mut rebuild_set);
    }

    let rebuild = order.iter().copied().filter(|i| rebuild_set.contains(i)).collect();
    BuildPlan { rebuild, link_required, archive_required }
}

fn missing_module_artifact(file: &crate::source::SourceFile, mod_dir: &Path) -> bool {
    if !matches!(file.kind, SourceKind::Fortran) {
        return false;
    }
    file.defined_modules.iter().any(|m| !mod_dir.join(format!("{m}.mod")).exists())
}

/// DFS over reverse edges (dependents), inserted idempotently.
fn collect_reverse_reachable(graph: &DependencyGraph<'_>, start: usize, out: &mut HashSet<usize>) {
    let mut stack = vec![start];
    while let Some(u) = stack.pop() {
        if !out.insert(u) {
            continue;
        }
        for &v in graph.dependents_of(u) {
            if !out.contains(&v) {
                stack.push(v);
            }
        }
    }
}

/// Any prior partial state (object count drifted from the current non-header source
/// count) is presumed inconsistent, forcing a full rebuild rather than risking a subtly
/// wrong incremental one.
fn cache_is_inconsistent(graph: &DependencyGraph<'_>, obj_dir: &Path) -> bool {
    let expected = (0..graph.len())
        .filter(|&i| !matches!(graph.file(i).kind, SourceKind::CHeader))
        .count();

    let actual = std::fs::read_dir(obj_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().and_then(|e| e.to_str()) == Some("o"))
                .count()
        })
        .unwrap_or(0);

    actual != expected
}
