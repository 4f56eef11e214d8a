//! Human-facing build narrative, layered over `tracing` (§4.10).
//!
//! `tracing` carries structured, leveled diagnostics for anyone running with
//! `RUST_LOG` set; this module is the separate, `yansi`-colored surface a developer
//! actually watches scroll by, mirroring the original's `print_info`/`print_ok`/
//! `print_error` helpers.

use yansi::Paint;

pub fn info(msg: impl std::fmt::Display) {
    info!("{msg}");
    println!("{} {msg}", Paint::blue("info:").bold());
}

pub fn ok(msg: impl std::fmt::Display) {
    info!("{msg}");
    println!("{} {msg}", Paint::green("ok:").bold());
}

pub fn error(msg: impl std::fmt::Display) {
    error!("{msg}");
    eprintln!("{} {msg}", Paint::red("error:").bold());
}

pub fn warn(msg: impl std::fmt::Display) {
    warn!("{msg}");
    eprintln!("{} {msg}", Paint::yellow("warn:").bold());
}

/// Installs the global `tracing` subscriber, honoring `RUST_LOG` for verbosity, the way
/// the binary entrypoint does it in every teacher crate in this pack.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).without_time().try_init();
}
