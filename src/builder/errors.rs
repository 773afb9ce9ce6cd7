//! Build error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the build engine.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Error raised while planning or executing a build.
///
/// Every variant is fatal for the current invocation: nothing is retried and
/// partially written objects are left for the next run's staleness check.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("compiler error detected!\n  command: {command}")]
    Compile {
        command: String,
        path: PathBuf,
        code: Option<i32>,
    },

    #[error("linker error detected!\n  command: {command}")]
    Link {
        command: String,
        target: PathBuf,
        code: Option<i32>,
    },

    #[error("transpiler error detected!\n  command: {command}")]
    Transpile {
        command: String,
        path: PathBuf,
        code: Option<i32>,
    },

    #[error("{0}")]
    Configuration(String),

    #[error("no compiler known for `{}` (extension: {})", path.display(), extension.as_deref().unwrap_or("<none>"))]
    MissingMetadata {
        path: PathBuf,
        extension: Option<String>,
    },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        error: std::io::Error,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },
}

impl BuildError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        BuildError::Configuration(message.into())
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            error,
        }
    }

    /// Exit code reported by the failing tool, if the error came from one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::Compile { code, .. }
            | BuildError::Link { code, .. }
            | BuildError::Transpile { code, .. } => *code,
            _ => None,
        }
    }
}
