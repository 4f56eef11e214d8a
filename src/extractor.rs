//! Dependency Extractor: regex-level scan for Fortran `module`/`use` and C `#include` (§4.2).

use crate::source::{SourceFile, SourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::HashMap, fs, path::Path};

static RE_MODULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^module\s+([A-Za-z_][A-Za-z0-9_]*)\b").unwrap()
});
static RE_MODULE_PROCEDURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^module\s+procedure\b").unwrap());
static RE_USE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^use\b\s*(?:,[^:]*::)?\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static RE_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^#include\s*"([^"]+)""#).unwrap());

/// Populates `defined_modules` and `dependencies` on every file in `files`, in place.
///
/// Two passes: the first over all files registers module definitions, so the second
/// pass's `use` resolution sees the complete mapping regardless of scan order.
pub fn extract(files: &mut [SourceFile]) {
    let mut module_index: HashMap<String, usize> = HashMap::new();

    for (i, file) in files.iter_mut().enumerate() {
        if matches!(file.kind, SourceKind::Fortran) {
            for module in defined_modules(&file.path) {
                file.defined_modules.push(module.clone());
                module_index.entry(module).or_insert(i);
            }
        }
    }

    // Headers participate as C-style dependency targets, matched by basename.
    let header_by_basename: HashMap<String, usize> = files
        .iter()
        .enumerate()
        .filter(|(_, f)| f.kind.is_header())
        .filter_map(|(i, f)| f.path.file_name().and_then(|n| n.to_str()).map(|n| (n.to_string(), i)))
        .collect();

    for i in 0..files.len() {
        let deps = match files[i].kind {
            SourceKind::Fortran => used_modules(&files[i].path)
                .into_iter()
                .filter_map(|name| module_index.get(&name).copied())
                .filter(|&j| j != i)
                .collect::<Vec<_>>(),
            SourceKind::C | SourceKind::CHeader => included_headers(&files[i].path)
                .into_iter()
                .filter_map(|name| header_by_basename.get(&name).copied())
                .filter(|&j| j != i)
                .collect::<Vec<_>>(),
        };
        for dep in deps {
            files[i].add_dependency(dep);
        }
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => contents.lines().map(str::to_owned).collect(),
        Err(err) => {
            warn!("unreadable source during extraction, treating as dependency-free: {}: {err}", path.display());
            Vec::new()
        }
    }
}

fn defined_modules(path: &Path) -> Vec<String> {
    let mut modules = Vec::new();
    for line in read_lines(path) {
        let trimmed = line.trim_start();
        if RE_MODULE_PROCEDURE.is_match(trimmed) {
            continue;
        }
        if let Some(caps) = RE_MODULE.captures(trimmed) {
            modules.push(caps[1].to_ascii_lowercase());
        }
    }
    modules
}

fn used_modules(path: &Path) -> Vec<String> {
    let mut uses = Vec::new();
    for line in read_lines(path) {
        let trimmed = line.trim_start();
        if let Some(caps) = RE_USE.captures(trimmed) {
            uses.push(caps[1].to_ascii_lowercase());
        }
    }
    uses
}

fn included_headers(path: &Path) -> Vec<String> {
    let mut headers = Vec::new();
    for line in read_lines(path) {
        let trimmed = line.trim_start();
        if let Some(caps) = RE_INCLUDE.captures(trimmed) {
            headers.push(caps[1].to_string());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) -> SourceFile {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        SourceFile::new(path, SourceKind::classify(Path::new(name)).unwrap())
    }

    #[test]
    fn resolves_module_use_chain() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![
            write(tmp.path(), "a.f90", "module alpha\nend module alpha\n"),
            write(tmp.path(), "b.f90", "module beta\nuse alpha\nend module beta\n"),
        ];
        extract(&mut files);
        assert_eq!(files[1].dependencies, vec![0]);
        assert!(files[0].dependencies.is_empty());
    }

    #[test]
    fn module_procedure_is_not_a_definition() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![write(tmp.path(), "a.f90", "module procedure foo\nend\n")];
        extract(&mut files);
        assert!(files[0].defined_modules.is_empty());
    }

    #[test]
    fn unresolved_use_is_silently_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![write(tmp.path(), "a.f90", "use iso_c_binding\n")];
        extract(&mut files);
        assert!(files[0].dependencies.is_empty());
    }

    #[test]
    fn case_insensitive_module_name_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![
            write(tmp.path(), "a.f90", "module Mod_A\nend\n"),
            write(tmp.path(), "b.f90", "use mod_a\n"),
        ];
        extract(&mut files);
        assert_eq!(files[1].dependencies, vec![0]);
    }

    #[test]
    fn quoted_include_resolves_to_scanned_header() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![
            write(tmp.path(), "main.c", "#include \"util.h\"\nint main(){return 0;}\n"),
            write(tmp.path(), "util.h", "void f(void);\n"),
        ];
        extract(&mut files);
        assert_eq!(files[0].dependencies, vec![1]);
    }

    #[test]
    fn angle_bracket_include_is_not_tracked() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![write(tmp.path(), "main.c", "#include <stdio.h>\n")];
        extract(&mut files);
        assert!(files[0].dependencies.is_empty());
    }

    #[test]
    fn use_keyword_requires_word_boundary() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![
            write(tmp.path(), "a.f90", "module used\nend\n"),
            write(
                tmp.path(),
                "b.f90",
                "used = .true.\nusefoo = 1\nuse_count = 3\n",
            ),
        ];
        extract(&mut files);
        assert!(files[1].dependencies.is_empty());
    }

    #[test]
    fn module_name_followed_by_trailing_comment_is_registered() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = vec![
            write(tmp.path(), "a.f90", "module physics ! core physics module\nend\n"),
            write(tmp.path(), "b.f90", "use physics\n"),
        ];
        extract(&mut files);
        assert_eq!(files[0].defined_modules, vec!["physics".to_string()]);
        assert_eq!(files[1].dependencies, vec![0]);
    }
}
