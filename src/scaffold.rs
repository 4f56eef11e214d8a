//! Project Scaffolder: the `new` command (§4.9).
//!
//! Grounded in `original_source/src/fortuna.c`'s `new` branch: directories, a hidden
//! cache directory, a default manifest, and a minimal `src/main.f90`. Directory
//! creation is idempotent, matching the C's `errno == EEXIST` tolerance.

use crate::config::MANIFEST_FILE;
use crate::error::{FortunaError, Result};
use crate::report;
use std::path::Path;

const DIRS: &[&str] = &["src", "mod", "obj", "data", "lib", "bin"];
const HIDDEN_DIRS: &[&str] = &[".cache"];

/// Materializes a new project rooted at `project_dir`: the standard directory layout,
/// a default `Fortuna.toml`, and a hello-world `src/main.f90`.
///
/// The original additionally copies a companion `maketopologicf90.exe` helper into
/// `bin/`; Fortuna's scanner/extractor/sorter run in-process, so there is no companion
/// executable to copy (§4.9).
pub fn scaffold(project_dir: &Path) -> Result<()> {
    let name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("fortuna_project")
        .to_string();

    create_dir_idempotent(project_dir)?;
    for dir in DIRS {
        create_dir_idempotent(&project_dir.join(dir))?;
    }
    for dir in HIDDEN_DIRS {
        create_dir_idempotent(&project_dir.join(dir))?;
    }

    write_manifest(project_dir, &name)?;
    write_main(project_dir)?;

    report::ok(format!("scaffolded project '{name}' at {}", project_dir.display()));
    Ok(())
}

fn create_dir_idempotent(path: &Path) -> Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => {
            report::ok(format!("created directory: {}", path.display()));
            Ok(())
        }
        Err(source) => Err(FortunaError::ScanDir { path: path.to_path_buf(), source }),
    }
}

fn write_manifest(project_dir: &Path, name: &str) -> Result<()> {
    let path = project_dir.join(MANIFEST_FILE);
    let contents = format!(
        r#"[build]
target = "{name}"
compiler = "gfortran"

flags = [
  "-cpp", "-fno-align-commons", "-O3",
  "-ffpe-trap=zero,invalid,underflow,overflow",
  "-std=legacy", "-ffixed-line-length-none", "-fall-intrinsics",
  "-Wno-unused-variable", "-Wno-unused-function",
  "-Wno-conversion", "-fopenmp", "-Imod"
]

obj_dir = "obj"
mod_dir = "mod"

[search]
deep = ["src"]
#shallow = ["lib", "include"]

[library]
#source-libs = ["lib/test.lib"]

[exclude]
#Requires the relative path from the Fortuna.toml file.
#files = ["src/some_file.f90"]

[lib]
#Placed in the lib folder and only supports static linking with ar
#target = "{name}.lib"

[args]
#cmd = "cmd_line_argument"
"#,
    );
    std::fs::write(&path, contents).map_err(|source| FortunaError::ManifestIo { path, source })?;
    report::ok("generated Fortuna.toml");
    Ok(())
}

fn write_main(project_dir: &Path) -> Result<()> {
    let path = project_dir.join("src").join("main.f90");
    let contents = "program main\n    print *, \"Hello World\"\nend program main\n";
    std::fs::write(&path, contents).map_err(FortunaError::Io)?;
    report::ok(format!("generated {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffolds_expected_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("demo");
        scaffold(&project).unwrap();

        for dir in DIRS {
            assert!(project.join(dir).is_dir(), "missing dir {dir}");
        }
        assert!(project.join(".cache").is_dir());
        assert!(project.join(MANIFEST_FILE).is_file());
        assert!(project.join("src/main.f90").is_file());

        let manifest = std::fs::read_to_string(project.join(MANIFEST_FILE)).unwrap();
        assert!(manifest.contains("target = \"demo\""));
    }

    #[test]
    fn scaffolding_twice_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("demo");
        scaffold(&project).unwrap();
        assert!(scaffold(&project).is_ok());
    }
}
