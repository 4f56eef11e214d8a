//! Compile/Link Orchestrator: command construction, the worker pool, and linking (§4.7).

use crate::error::{FortunaError, Result};
use crate::graph::DependencyGraph;
use crate::planner::BuildPlan;
use crate::source::SourceKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

/// A fully-formed compile command for one source, created by the orchestrator and
/// consumed, unmodified, by exactly one worker (§3).
#[derive(Debug, Clone)]
pub struct CompileJob {
    pub source_idx: usize,
    pub source_path: PathBuf,
    pub command: String,
}

pub struct OrchestratorConfig<'a> {
    pub compiler: &'a str,
    pub flags: &'a [String],
    pub obj_dir: &'a Path,
    pub mod_dir: &'a Path,
    pub target: &'a Path,
    pub extra_libs: &'a [String],
    pub parallel: bool,
    pub jobs: usize,
    /// Indexed in parallel with the graph's file table. Excluded sources are discovered
    /// by the scanner like any other file but are never compiled nor linked (§6, scenario 6).
    pub excluded: &'a [bool],
}

impl OrchestratorConfig<'_> {
    fn is_excluded(&self, idx: usize) -> bool {
        self.excluded.get(idx).copied().unwrap_or(false)
    }
}

/// Object path for a compiled source: `{obj_dir}/{stem}.o`.
pub fn object_path(obj_dir: &Path, source: &Path) -> PathBuf {
    let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    obj_dir.join(format!("{stem}.o"))
}

fn build_command(cfg: &OrchestratorConfig<'_>, source: &Path, kind: SourceKind) -> String {
    let obj = object_path(cfg.obj_dir, source);
    let flags = cfg.flags.join(" ");
    match kind {
        SourceKind::Fortran => format!(
            "{} {} -J{} -c {} -o {}",
            cfg.compiler,
            flags,
            cfg.mod_dir.display(),
            source.display(),
            obj.display(),
        ),
        SourceKind::C => format!(
            "{} {} -c {} -o {}",
            cfg.compiler,
            flags,
            source.display(),
            obj.display(),
        ),
        SourceKind::CHeader => unreachable!("headers are never compile units"),
    }
}

/// Builds one [`CompileJob`] per non-header file in the plan's rebuild set.
pub fn build_jobs(graph: &DependencyGraph<'_>, plan: &BuildPlan, cfg: &OrchestratorConfig<'_>) -> Vec<CompileJob> {
    plan.rebuild
        .iter()
        .copied()
        .filter(|&idx| !matches!(graph.file(idx).kind, SourceKind::CHeader))
        .filter(|&idx| !cfg.is_excluded(idx))
        .map(|idx| {
            let file = graph.file(idx);
            CompileJob {
                source_idx: idx,
                source_path: file.path.clone(),
                command: build_command(cfg, &file.path, file.kind),
            }
        })
        .collect()
}

/// Runs a shell-less command string by splitting on whitespace; the first token is the
/// program, the rest are arguments. Mirrors the original's `system()`-style invocation
/// but without a shell, so arguments containing spaces are not supported — consistent
/// with the space-joined command strings §4.7 specifies.
fn spawn(command: &str) -> std::io::Result<std::process::ExitStatus> {
    let mut parts = command.split_whitespace();
    let program = parts.next().unwrap_or_default();
    Command::new(program).args(parts).status()
}

/// Runs every job in the plan's rebuild set, split into topological-layer waves if
/// `graph`/`order`/`plan` call for a cold-cache build (no prior `.cache/` state) and
/// `layered` is requested by the caller; otherwise runs the whole set as one batch.
/// Each wave is compiled either serially or on a bounded `rayon` pool, short-circuiting
/// on the first failure once the in-flight wave has joined (§5, §9).
pub fn compile(jobs: &[CompileJob], graph: &DependencyGraph<'_>, cfg: &OrchestratorConfig<'_>, layered: bool) -> Result<()> {
    if jobs.is_empty() {
        return Ok(());
    }

    if layered {
        let layers = graph.topological_layers()?;
        for layer in &layers {
            let wave: Vec<&CompileJob> =
                jobs.iter().filter(|j| layer.contains(&j.source_idx)).collect();
            if wave.is_empty() {
                continue;
            }
            run_wave(&wave, cfg)?;
        }
        Ok(())
    } else {
        let wave: Vec<&CompileJob> = jobs.iter().collect();
        run_wave(&wave, cfg)
    }
}

fn run_wave(wave: &[&CompileJob], cfg: &OrchestratorConfig<'_>) -> Result<()> {
    if cfg.parallel {
        run_wave_parallel(wave, cfg.jobs)
    } else {
        for job in wave {
            run_one(job)?;
        }
        Ok(())
    }
}

fn run_wave_parallel(wave: &[&CompileJob], num_jobs: usize) -> Result<()> {
    use rayon::prelude::*;

    let first_error: std::sync::Mutex<Option<FortunaError>> = std::sync::Mutex::new(None);
    let aborted = AtomicBool::new(false);

    let pool = rayon::ThreadPoolBuilder::new().num_threads(num_jobs.max(1)).build().map_err(|e| {
        FortunaError::Message(format!("failed to start compile worker pool: {e}"))
    })?;

    pool.install(|| {
        wave.par_iter().for_each(|job| {
            if aborted.load(Ordering::Relaxed) {
                return;
            }
            if let Err(err) = run_one(job) {
                aborted.store(true, Ordering::Relaxed);
                let mut slot = first_error.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(err);
                }
            }
        });
    });

    match first_error.into_inner().unwrap() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn run_one(job: &CompileJob) -> Result<()> {
    debug!("compiling: {}", job.command);
    let status = spawn(&job.command)
        .map_err(|source| FortunaError::Spawn { command: job.command.clone(), source })?;
    if !status.success() {
        return Err(FortunaError::CompileFailed {
            path: job.source_path.clone(),
            status: status.to_string(),
        });
    }
    Ok(())
}

/// Links every non-header source's object file into `cfg.target`, appending configured
/// extra libraries. A missing object is fatal (§4.7).
pub fn link(graph: &DependencyGraph<'_>, cfg: &OrchestratorConfig<'_>) -> Result<()> {
    let objects = all_objects(graph, cfg)?;
    let flags = cfg.flags.join(" ");
    let mut command = format!("{} {}", cfg.compiler, flags);
    for obj in &objects {
        command.push(' ');
        command.push_str(&obj.display().to_string());
    }
    command.push_str(" -o ");
    command.push_str(&cfg.target.display().to_string());
    for lib in cfg.extra_libs {
        command.push(' ');
        command.push_str(lib);
    }

    debug!("linking: {command}");
    let status = spawn(&command).map_err(|source| FortunaError::Spawn { command: command.clone(), source })?;
    if !status.success() {
        return Err(FortunaError::LinkFailed { status: status.to_string() });
    }
    Ok(())
}

/// Archives every non-header source's object file with `ar rcs` into `archive_path`.
pub fn archive(graph: &DependencyGraph<'_>, cfg: &OrchestratorConfig<'_>, archive_path: &Path) -> Result<()> {
    let objects = all_objects(graph, cfg)?;
    let mut command = format!("ar rcs {}", archive_path.display());
    for obj in &objects {
        command.push(' ');
        command.push_str(&obj.display().to_string());
    }

    debug!("archiving: {command}");
    let status = spawn(&command).map_err(|source| FortunaError::Spawn { command: command.clone(), source })?;
    if !status.success() {
        return Err(FortunaError::ArchiveFailed { status: status.to_string() });
    }
    Ok(())
}

fn all_objects(graph: &DependencyGraph<'_>, cfg: &OrchestratorConfig<'_>) -> Result<Vec<PathBuf>> {
    let mut objects = Vec::new();
    for i in 0..graph.len() {
        let file = graph.file(i);
        if matches!(file.kind, SourceKind::CHeader) || cfg.is_excluded(i) {
            continue;
        }
        let obj = object_path(cfg.obj_dir, &file.path);
        if !obj.exists() {
            return Err(FortunaError::MissingObject(obj));
        }
        objects.push(obj);
    }
    Ok(objects)
}
