//! Error types for the Fortuna build driver.

use std::path::PathBuf;

pub type Result<T, E = FortunaError> = std::result::Result<T, E>;

/// All fallible outcomes the driver can produce, from manifest loading through linking.
#[derive(Debug, thiserror::Error)]
pub enum FortunaError {
    #[error("failed to read manifest at {path}: {source}")]
    ManifestIo { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse manifest at {path}: {source}")]
    ManifestParse { path: PathBuf, #[source] source: toml::de::Error },

    #[error("missing required manifest key '{0}'")]
    MissingConfigKey(&'static str),

    #[error("cannot scan directory {path}: {source}")]
    ScanDir { path: PathBuf, #[source] source: std::io::Error },

    #[error("cyclic dependency detected among project sources")]
    CycleDetected,

    #[error("compilation failed for {path} (exit status {status})")]
    CompileFailed { path: PathBuf, status: String },

    #[error("link step failed (exit status {status})")]
    LinkFailed { status: String },

    #[error("archive step failed (exit status {status})")]
    ArchiveFailed { status: String },

    #[error("object file {0} is missing; cannot link")]
    MissingObject(PathBuf),

    #[error("failed to spawn process '{command}': {source}")]
    Spawn { command: String, #[source] source: std::io::Error },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

impl FortunaError {
    pub fn msg(msg: impl std::fmt::Display) -> Self {
        Self::Message(msg.to_string())
    }

    /// Process exit code conventionally associated with this failure.
    ///
    /// Distinct from compile/link failures per the error taxonomy so callers can
    /// script around "my dependency graph is broken" differently from "my code doesn't build".
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CycleDetected => 2,
            Self::ManifestIo { .. } | Self::ManifestParse { .. } | Self::MissingConfigKey(_) => 3,
            Self::CompileFailed { .. } => 4,
            Self::LinkFailed { .. } | Self::ArchiveFailed { .. } | Self::MissingObject(_) => 5,
            _ => 1,
        }
    }
}
