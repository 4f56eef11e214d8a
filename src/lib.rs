#![doc = include_str!("../README.md")]
#![warn(rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

#[macro_use]
extern crate tracing;

pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod hash;
pub mod orchestrator;
pub mod planner;
pub mod report;
pub mod scaffold;
pub mod scanner;
pub mod source;
pub mod suggest;

use config::Manifest;
use error::{FortunaError, Result};
use graph::DependencyGraph;
use planner::PlannerInputs;
use std::path::{Path, PathBuf};

/// Flags shared by `build` and `run` (§6).
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub parallel: bool,
    /// Worker count when `parallel` is set; `0` means "use `num_cpus::get()`".
    pub jobs: usize,
    pub force_full: bool,
    /// `--lib`: build the archive only, skip the executable link.
    pub lib_only: bool,
}

/// Runs the full incremental-build pipeline once: scan, extract, sort, plan, compile,
/// link/archive, and persist the caches (§2). Returns `Ok(())` even when the planner
/// found nothing to build — the caller distinguishes that case via the logged narrative,
/// not a special return value, matching the original's "nothing to build" being a
/// successful no-op rather than a distinct outcome.
pub fn build(project_root: &Path, opts: &BuildOptions) -> Result<()> {
    let manifest = Manifest::load(project_root)?;

    let cache_dir = project_root.join(".cache");
    let obj_dir = manifest.obj_dir(project_root);
    let mod_dir = manifest.mod_dir(project_root);
    for dir in [&cache_dir, &obj_dir, &mod_dir] {
        std::fs::create_dir_all(dir).map_err(FortunaError::Io)?;
    }

    let deep = manifest.deep_roots(project_root);
    let shallow = manifest.shallow_roots(project_root);
    let mut files = scanner::scan(&deep, &shallow)?;
    extractor::extract(&mut files);

    let graph = DependencyGraph::new(&files);
    let order = graph.topological_order()?;

    let mut prev_hashes = cache::PrevHashTable::load(&cache_dir);
    let cold_cache = prev_hashes.is_empty();
    prev_hashes.retain(files.iter().map(|f| f.path.clone()));

    let archive_target = manifest.archive_target();
    let build_plan = planner::plan(PlannerInputs {
        graph: &graph,
        order: &order,
        prev_hashes: &prev_hashes,
        mod_dir: &mod_dir,
        obj_dir: &obj_dir,
        force_full: opts.force_full,
        link_required: !opts.lib_only,
        archive_required: archive_target.is_some(),
    });

    if build_plan.nothing_to_build() {
        report::info("nothing to build");
        return Ok(());
    }

    let excluded: Vec<bool> =
        files.iter().map(|f| manifest.is_excluded(&f.path, project_root)).collect();
    let target_path = project_root.join(&manifest.build.target);
    let archive_path = archive_target.map(|name| project_root.join("lib").join(name));

    let orch_cfg = orchestrator::OrchestratorConfig {
        compiler: &manifest.build.compiler,
        flags: &manifest.build.flags,
        obj_dir: &obj_dir,
        mod_dir: &mod_dir,
        target: &target_path,
        extra_libs: &manifest.library.source_libs,
        parallel: opts.parallel,
        jobs: worker_count(opts),
        excluded: &excluded,
    };

    let jobs = orchestrator::build_jobs(&graph, &build_plan, &orch_cfg);
    if !jobs.is_empty() {
        report::info(format!("compiling {} file(s)", jobs.len()));
        orchestrator::compile(&jobs, &graph, &orch_cfg, cold_cache)?;
    }

    if build_plan.link_required {
        orchestrator::link(&graph, &orch_cfg)?;
        report::ok(format!("linked {}", target_path.display()));
    }
    if let Some(archive_path) = &archive_path {
        orchestrator::archive(&graph, &orch_cfg, archive_path)?;
        report::ok(format!("archived {}", archive_path.display()));
    }

    let fingerprints = hash::fingerprint_all(&files);
    cache::write_hash_file(&cache_dir, &files, &fingerprints).map_err(FortunaError::Io)?;
    cache::write_topo_file(&cache_dir, &graph, &order).map_err(FortunaError::Io)?;

    report::ok("build successful");
    Ok(())
}

fn worker_count(opts: &BuildOptions) -> usize {
    if !opts.parallel {
        return 1;
    }
    if opts.jobs > 0 {
        opts.jobs
    } else {
        num_cpus::get()
    }
}

/// Removes and recreates the object and module directories (`clean`, §6).
pub fn clean(project_root: &Path) -> Result<()> {
    let manifest = Manifest::load(project_root)?;
    for dir in [manifest.obj_dir(project_root), manifest.mod_dir(project_root)] {
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(FortunaError::Io)?;
        }
        std::fs::create_dir_all(&dir).map_err(FortunaError::Io)?;
    }
    report::ok("cleaned obj/ and mod/");
    Ok(())
}

/// Builds if needed, then spawns the produced executable (`run`, §6). `bin_override`
/// corresponds to `--bin NAME`; `manifest.args.cmd` is forwarded as the spawned
/// process's argument string.
pub fn run(project_root: &Path, opts: &BuildOptions, bin_override: Option<&str>) -> Result<i32> {
    build(project_root, opts)?;

    let manifest = Manifest::load(project_root)?;
    let target_name = bin_override.unwrap_or(&manifest.build.target);
    let target_path = project_root.join(target_name);

    let mut command = std::process::Command::new(&target_path);
    if let Some(cmd) = &manifest.args.cmd {
        command.args(cmd.split_whitespace());
    }

    let status = command.status().map_err(|source| FortunaError::Spawn {
        command: target_path.display().to_string(),
        source,
    })?;
    Ok(status.code().unwrap_or(1))
}

/// Scaffolds a new project directory (`new NAME`, §4.9).
pub fn new_project(project_dir: &Path) -> Result<()> {
    scaffold::scaffold(project_dir)
}

pub fn default_manifest_path(project_root: &Path) -> PathBuf {
    project_root.join(config::MANIFEST_FILE)
}
