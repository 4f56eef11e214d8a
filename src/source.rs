//! The [`SourceFile`] record and its classification.

use std::path::{Path, PathBuf};

/// What a scanned file is, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Fortran,
    C,
    CHeader,
}

impl SourceKind {
    /// Classifies `path` by its extension, case-insensitively. Strict suffix match only
    /// (see Open Questions): `file.fast` is not Fortran.
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "f" | "f77" | "f90" | "for" => Some(Self::Fortran),
            "c" => Some(Self::C),
            "h" => Some(Self::CHeader),
            _ => None,
        }
    }

    pub fn is_header(self) -> bool {
        matches!(self, Self::CHeader)
    }
}

/// A single scanned source (or header) file, its defined modules and direct dependencies.
///
/// Dependencies are stored as indices into the owning [`crate::graph::DependencyGraph`]'s
/// file table, never as pointers — see Design Notes on cyclic ownership.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Lowercased Fortran module names this file defines. Empty for C/header files.
    pub defined_modules: Vec<String>,
    /// Deduplicated indices of other files this file directly depends on.
    pub dependencies: Vec<usize>,
}

impl SourceFile {
    pub fn new(path: PathBuf, kind: SourceKind) -> Self {
        Self { path, kind, defined_modules: Vec::new(), dependencies: Vec::new() }
    }

    pub fn add_dependency(&mut self, idx: usize) {
        if !self.dependencies.contains(&idx) {
            self.dependencies.push(idx);
        }
    }

    /// Basename with its source extension stripped, e.g. `src/foo.F90` -> `foo`.
    pub fn stem(&self) -> String {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string()
    }
}
