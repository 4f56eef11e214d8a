//! The project manifest (`Fortuna.toml`) and the Config Provider contract (§3, §4.8, §6).
//!
//! Upstream realizes the Config Provider as dotted-string lookups (`get_string`,
//! `get_array`) over a generic TOML table. Here the contract is realized as a
//! `serde::Deserialize` struct tree instead — struct field access plays the role of
//! `get_string`/`get_array`, which is the idiomatic shape for a fixed, known schema.

use crate::error::{FortunaError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "Fortuna.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub build: BuildSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub exclude: ExcludeSection,
    #[serde(default)]
    pub lib: LibSection,
    #[serde(default)]
    pub library: LibrarySection,
    #[serde(default)]
    pub args: ArgsSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    pub target: String,
    pub compiler: String,
    pub flags: Vec<String>,
    #[serde(default = "default_obj_dir")]
    pub obj_dir: String,
    #[serde(default = "default_mod_dir")]
    pub mod_dir: String,
}

fn default_obj_dir() -> String {
    "obj".to_string()
}

fn default_mod_dir() -> String {
    "mod".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub deep: Vec<String>,
    #[serde(default)]
    pub shallow: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeSection {
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibSection {
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibrarySection {
    #[serde(rename = "source-libs", default)]
    pub source_libs: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArgsSection {
    pub cmd: Option<String>,
}

impl Manifest {
    /// Loads and parses `Fortuna.toml` from `project_root`. A missing file or a required
    /// key absent from it is fatal per §4.8/§7; malformed TOML surfaces the parser's own
    /// message through [`FortunaError::ManifestParse`].
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(MANIFEST_FILE);
        let contents = std::fs::read_to_string(&path)
            .map_err(|source| FortunaError::ManifestIo { path: path.clone(), source })?;
        let manifest: Manifest = toml::from_str(&contents)
            .map_err(|source| FortunaError::ManifestParse { path: path.clone(), source })?;
        if manifest.build.target.trim().is_empty() {
            return Err(FortunaError::MissingConfigKey("build.target"));
        }
        if manifest.build.compiler.trim().is_empty() {
            return Err(FortunaError::MissingConfigKey("build.compiler"));
        }
        Ok(manifest)
    }

    pub fn obj_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.build.obj_dir)
    }

    pub fn mod_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.build.mod_dir)
    }

    pub fn deep_roots(&self, project_root: &Path) -> Vec<PathBuf> {
        self.search.deep.iter().map(|d| project_root.join(d)).collect()
    }

    pub fn shallow_roots(&self, project_root: &Path) -> Vec<PathBuf> {
        self.search.shallow.iter().map(|d| project_root.join(d)).collect()
    }

    pub fn is_excluded(&self, path: &Path, project_root: &Path) -> bool {
        self.exclude.files.iter().any(|f| project_root.join(f) == path)
    }

    pub fn archive_target(&self) -> Option<&str> {
        self.lib.target.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, body: &str) {
        std::fs::write(dir.join(MANIFEST_FILE), body).unwrap();
    }

    #[test]
    fn loads_required_and_defaulted_fields() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            r#"
            [build]
            target = "app"
            compiler = "gfortran"
            flags = ["-O2"]

            [search]
            deep = ["src"]
            "#,
        );
        let manifest = Manifest::load(tmp.path()).unwrap();
        assert_eq!(manifest.build.target, "app");
        assert_eq!(manifest.build.obj_dir, "obj");
        assert_eq!(manifest.build.mod_dir, "mod");
        assert_eq!(manifest.search.deep, vec!["src".to_string()]);
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(Manifest::load(tmp.path()), Err(FortunaError::ManifestIo { .. })));
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(tmp.path(), "[build]\ntarget = \"\"\ncompiler = \"gfortran\"\nflags = []\n");
        assert!(matches!(Manifest::load(tmp.path()), Err(FortunaError::MissingConfigKey(_))));
    }

    #[test]
    fn source_libs_and_args_cmd_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(
            tmp.path(),
            r#"
            [build]
            target = "app"
            compiler = "gfortran"
            flags = []

            [library]
            source-libs = ["lib/extra.a"]

            [args]
            cmd = "--flag value"
            "#,
        );
        let manifest = Manifest::load(tmp.path()).unwrap();
        assert_eq!(manifest.library.source_libs, vec!["lib/extra.a".to_string()]);
        assert_eq!(manifest.args.cmd.as_deref(), Some("--flag value"));
    }
}
