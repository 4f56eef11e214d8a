use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Parser, Subcommand};
use fortuna::{report, suggest, BuildOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fortuna", about = "Incremental build driver for mixed Fortran/C projects")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scaffold a new project directory.
    New {
        name: PathBuf,
    },
    /// Run the build engine once.
    Build {
        #[arg(short = 'j', long = "parallel")]
        parallel: bool,
        #[arg(short = 'r', long = "rebuild")]
        rebuild: bool,
        #[arg(long = "lib")]
        lib: bool,
    },
    /// Build if needed, then spawn the produced executable.
    Run {
        #[arg(short = 'j', long = "parallel")]
        parallel: bool,
        #[arg(short = 'r', long = "rebuild")]
        rebuild: bool,
        #[arg(long = "lib")]
        lib: bool,
        #[arg(long = "bin")]
        bin: Option<String>,
    },
    /// Remove and recreate the object and module directories.
    Clean,
}

fn main() -> ExitCode {
    report::init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return handle_parse_error(err),
    };

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let result = match cli.command {
        Command::New { name } => fortuna::new_project(&name),
        Command::Build { parallel, rebuild, lib } => {
            let opts = BuildOptions { parallel, jobs: 0, force_full: rebuild, lib_only: lib };
            fortuna::build(&project_root, &opts)
        }
        Command::Run { parallel, rebuild, lib, bin } => {
            let opts = BuildOptions { parallel, jobs: 0, force_full: rebuild, lib_only: lib };
            match fortuna::run(&project_root, &opts, bin.as_deref()) {
                Ok(code) => return ExitCode::from(code.clamp(0, 255) as u8),
                Err(err) => Err(err),
            }
        }
        Command::Clean => fortuna::clean(&project_root),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::error(&err);
            ExitCode::from(err.exit_code().clamp(0, 255) as u8)
        }
    }
}

/// Unknown flags and subcommands reach here before `fortuna`'s own dispatch ever sees
/// them, since `clap` rejects them up front; the fuzzy suggester is invoked from this
/// handler rather than from a hand-rolled pre-dispatch scan (§6).
fn handle_parse_error(err: clap::Error) -> ExitCode {
    if matches!(err.kind(), ErrorKind::UnknownArgument | ErrorKind::InvalidSubcommand) {
        let bad_token = err
            .get(ContextKind::InvalidArg)
            .or_else(|| err.get(ContextKind::InvalidSubcommand))
            .and_then(|value| match value {
                ContextValue::String(s) => Some(s.as_str()),
                _ => None,
            });

        if let Some(token) = bad_token {
            match suggest::suggest(token) {
                Some(word) => report::error(format!("unknown flag: did you mean: {word}?")),
                None => report::error("unknown flag"),
            }
            return ExitCode::from(1);
        }
    }

    err.print().ok();
    ExitCode::from(err.exit_code().clamp(0, 255) as u8)
}
