//! `cbuild install` command

use anyhow::Result;

use super::load_project;
use crate::cli::BuildArgs;
use cbuild::ops::{install, BuildOptions};

pub fn execute(args: BuildArgs) -> Result<()> {
    let (manifest, config) = load_project()?;

    let result = install(&manifest, &config, &BuildOptions::from(args))?;
    eprintln!(
        "   Installed {} module(s) from {}",
        result.report.linked.len(),
        result.lib_dir.display()
    );

    Ok(())
}
