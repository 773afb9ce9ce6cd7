//! Global context for cbuild operations.
//!
//! Provides centralized access to the working directory, the manifest and
//! the merged configuration.

use std::path::{Path, PathBuf};

use crate::builder::errors::{BuildError, Result};
use crate::core::manifest::{find_manifest, MANIFEST_NAME};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context shared by all commands.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
}

impl GlobalContext {
    /// Create a context rooted at the current working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| BuildError::io(".", e))?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context rooted at an explicit directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        GlobalContext { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Locate Cbuild.toml in the working directory or one of its parents.
    pub fn find_manifest(&self) -> Result<PathBuf> {
        find_manifest(&self.cwd).ok_or_else(|| {
            BuildError::config(format!(
                "could not find `{}` in `{}` or any parent directory",
                MANIFEST_NAME,
                self.cwd.display()
            ))
        })
    }

    /// Load global + project configuration, then apply environment overrides.
    pub fn load_config(&self, project_root: &Path) -> Config {
        let global = global_config_path();
        let mut config = load_config(global.as_deref(), &project_config_path(project_root));
        config.apply_env(|var| std::env::var(var).ok());
        config
    }
}
