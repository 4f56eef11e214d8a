//! Dependency Cache: the two flat text files under `.cache/` (§4.5).
//!
//! `topo.dep` records, per target, its dependency list in topological order; `hash.dep`
//! records the previous content fingerprint per path. Both are plain ASCII and
//! line-oriented so a developer can `cat` them while debugging a stale build.

use crate::graph::DependencyGraph;
use crate::hash::Fingerprint;
use crate::source::SourceFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const TOPO_FILE: &str = "topo.dep";
pub const HASH_FILE: &str = "hash.dep";

/// Previously recorded fingerprints, indexed by path. Loading is tolerant of malformed
/// lines and of entries for files no longer present (callers prune via [`Self::retain`]).
#[derive(Debug, Default, Clone)]
pub struct PrevHashTable {
    entries: HashMap<PathBuf, Fingerprint>,
}

impl PrevHashTable {
    /// Loads `hash.dep` from `cache_dir`. Absence of the file means "no prior state";
    /// this is reported as an empty table rather than an error (§4.5, §7).
    pub fn load(cache_dir: &Path) -> Self {
        let path = cache_dir.join(HASH_FILE);
        let mut entries = HashMap::new();
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self { entries };
        };
        for line in contents.lines() {
            let mut parts = line.split_whitespace();
            let (Some(path), Some(fp)) = (parts.next(), parts.next()) else { continue };
            let Ok(fp) = fp.parse::<Fingerprint>() else { continue };
            entries.insert(PathBuf::from(path), fp);
        }
        Self { entries }
    }

    pub fn get(&self, path: &Path) -> Option<Fingerprint> {
        self.entries.get(path).copied()
    }

    /// Drops entries whose path is not one of `live_paths` — the pruning pass described
    /// in §4.5 for files deleted since the last build.
    pub fn retain(&mut self, live_paths: impl IntoIterator<Item = PathBuf>) {
        let live: std::collections::HashSet<PathBuf> = live_paths.into_iter().collect();
        self.entries.retain(|path, _| live.contains(path));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Writes `hash.dep` for every file in `files`, paired with its current fingerprint.
/// Written to a sibling temp file and renamed into place so a concurrent `build`/`run`
/// invocation never observes a half-written cache (§5).
pub fn write_hash_file(
    cache_dir: &Path,
    files: &[SourceFile],
    fingerprints: &[Fingerprint],
) -> std::io::Result<()> {
    let mut out = String::new();
    for (file, fp) in files.iter().zip(fingerprints) {
        out.push_str(&file.path.to_string_lossy());
        out.push(' ');
        out.push_str(&fp.to_string());
        out.push('\n');
    }
    atomic_write(&cache_dir.join(HASH_FILE), &out)
}

/// Writes `topo.dep`: one `TARGET: DEP1 DEP2 …` line per file, in the topological order
/// produced by [`DependencyGraph::topological_order`]. Headers are included as targets
/// with (typically) empty dependency lists, per §4.5.
pub fn write_topo_file(
    cache_dir: &Path,
    graph: &DependencyGraph<'_>,
    order: &[usize],
) -> std::io::Result<()> {
    let mut out = String::new();
    for &idx in order {
        let file = graph.file(idx);
        out.push_str(&file.path.to_string_lossy());
        out.push(':');
        for &dep in &file.dependencies {
            out.push(' ');
            out.push_str(&graph.file(dep).path.to_string_lossy());
        }
        out.push('\n');
    }
    atomic_write(&cache_dir.join(TOPO_FILE), &out)
}

fn atomic_write(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;

    #[test]
    fn hash_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let files = vec![
            SourceFile::new(PathBuf::from("a.f90"), SourceKind::Fortran),
            SourceFile::new(PathBuf::from("b.f90"), SourceKind::Fortran),
        ];
        let fingerprints = vec![111u32, 222u32];
        write_hash_file(tmp.path(), &files, &fingerprints).unwrap();

        let table = PrevHashTable::load(tmp.path());
        assert_eq!(table.get(Path::new("a.f90")), Some(111));
        assert_eq!(table.get(Path::new("b.f90")), Some(222));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_hash_file_is_empty_table_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let table = PrevHashTable::load(tmp.path());
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(HASH_FILE), "a.f90 123\ngarbage-line\nb.f90 notanumber\nc.f90 456\n")
            .unwrap();
        let table = PrevHashTable::load(tmp.path());
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(Path::new("a.f90")), Some(123));
        assert_eq!(table.get(Path::new("c.f90")), Some(456));
    }

    #[test]
    fn retain_prunes_deleted_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(HASH_FILE), "a.f90 1\nb.f90 2\n").unwrap();
        let mut table = PrevHashTable::load(tmp.path());
        table.retain([PathBuf::from("a.f90")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(Path::new("b.f90")), None);
    }

    #[test]
    fn topo_file_lists_dependencies_space_separated() {
        let tmp = tempfile::tempdir().unwrap();
        let files = vec![
            SourceFile::new(PathBuf::from("a.f90"), SourceKind::Fortran),
            {
                let mut f = SourceFile::new(PathBuf::from("b.f90"), SourceKind::Fortran);
                f.dependencies.push(0);
                f
            },
        ];
        let graph = DependencyGraph::new(&files);
        let order = graph.topological_order().unwrap();
        write_topo_file(tmp.path(), &graph, &order).unwrap();

        let contents = std::fs::read_to_string(tmp.path().join(TOPO_FILE)).unwrap();
        assert!(contents.contains("a.f90:\n"));
        assert!(contents.contains("b.f90: a.f90\n"));
    }
}
