//! `cbuild clean` command

use anyhow::Result;

use super::load_project;
use crate::cli::CleanArgs;
use cbuild::ops::{clean, CleanOptions};

pub fn execute(args: CleanArgs) -> Result<()> {
    let (manifest, _) = load_project()?;

    let removed = clean(&manifest, &CleanOptions { all: args.all })?;
    for dir in &removed {
        eprintln!("     Removed {}", dir.display());
    }

    Ok(())
}
