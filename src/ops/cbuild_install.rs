//! Implementation of `cbuild install`.
//!
//! Wraps an external packaging tool: its build step must leave exactly one
//! `lib.*` directory behind, the extension modules are built straight into
//! it, then its install step runs.

use std::path::{Path, PathBuf};

use crate::builder::executor::BuildReport;
use crate::builder::{BuildError, Result};
use crate::core::manifest::Manifest;
use crate::ops::cbuild_build::{build_manifest, BuildOptions};
use crate::util::config::Config;
use crate::util::fs::glob_dirs;
use crate::util::process::ProcessBuilder;

/// Result of an install.
#[derive(Debug)]
pub struct InstallResult {
    /// The packaging output directory the modules were built into
    pub lib_dir: PathBuf,

    pub report: BuildReport,
}

/// Find the single `lib.*` directory under the packaging build directory.
pub fn locate_package_output(build_dir: &Path) -> Result<PathBuf> {
    let mut found = glob_dirs(&build_dir.join("lib.*"))?;
    match found.len() {
        0 => Err(BuildError::config(format!(
            "no packaging output found in `{}`; run the packaging build first",
            build_dir.display()
        ))),
        1 => Ok(found.remove(0)),
        n => Err(BuildError::config(format!(
            "ambiguous packaging output: {} `lib.*` directories in `{}` ({})",
            n,
            build_dir.display(),
            found
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Run a packaging command in `cwd`, failing on a nonzero exit.
fn run_package_command(what: &str, command: &[String], cwd: &Path) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| BuildError::config(format!("empty package {} command", what)))?;

    let process = ProcessBuilder::new(program).args(args).cwd(cwd);
    tracing::info!("{}", process.display_command());
    let status = process.status()?;
    if !status.success() {
        return Err(BuildError::config(format!(
            "package {} command `{}` failed ({})",
            what,
            process.display_command(),
            status
        )));
    }
    Ok(())
}

/// Run the packaging build, build the modules into its output, then install.
pub fn install(manifest: &Manifest, config: &Config, opts: &BuildOptions) -> Result<InstallResult> {
    let root = &manifest.manifest_dir;

    if let Some(command) = &manifest.package.build_command {
        run_package_command("build", command, root)?;
    }

    let lib_dir = locate_package_output(&manifest.package_build_dir())?;
    tracing::info!("building extension modules into {}", lib_dir.display());

    let opts = BuildOptions {
        final_dir: Some(lib_dir.clone()),
        ..opts.clone()
    };
    let report = build_manifest(manifest, config, &opts)?;

    if let Some(command) = &manifest.package.install_command {
        run_package_command("install", command, root)?;
    }

    Ok(InstallResult { lib_dir, report })
}
