//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod install;
pub mod toolchain;

use anyhow::Result;

use crate::cli::BuildArgs;
use cbuild::ops::BuildOptions;
use cbuild::util::Config;
use cbuild::{GlobalContext, Manifest};

/// Load the manifest and configuration for the current directory.
pub fn load_project() -> Result<(Manifest, Config)> {
    let ctx = GlobalContext::new()?;
    let manifest = Manifest::load(&ctx.find_manifest()?)?;
    let config = ctx.load_config(&manifest.manifest_dir);
    Ok((manifest, config))
}

impl From<BuildArgs> for BuildOptions {
    fn from(args: BuildArgs) -> Self {
        BuildOptions {
            arch: args.arch,
            define_macros: args.define,
            include_dirs: args.include,
            lib_dirs: args.lib_dir,
            final_dir: None,
        }
    }
}
