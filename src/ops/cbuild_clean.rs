//! Implementation of `cbuild clean`.

use std::path::PathBuf;

use crate::builder::Result;
use crate::core::manifest::Manifest;
use crate::util::fs::remove_dir_all_if_exists;

/// Options for the clean command.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Also remove finished extension modules
    pub all: bool,
}

/// Remove build outputs. Returns the directories that were removed.
pub fn clean(manifest: &Manifest, opts: &CleanOptions) -> Result<Vec<PathBuf>> {
    let mut targets = vec![manifest.temp_dir()];
    if opts.all {
        targets.push(manifest.final_dir());
    }

    let mut removed = Vec::new();
    for dir in targets {
        if remove_dir_all_if_exists(&dir)? {
            tracing::info!("removed {}", dir.display());
            removed.push(dir);
        } else {
            tracing::debug!("{} does not exist", dir.display());
        }
    }
    Ok(removed)
}
