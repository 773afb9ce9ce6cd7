//! High-level operations.
//!
//! This module contains the implementation of cbuild commands.

pub mod cbuild_build;
pub mod cbuild_clean;
pub mod cbuild_install;

pub use cbuild_build::{
    build, build_context, build_manifest, host_for, plan_manifest, toolchain_for, BuildOptions,
};
pub use cbuild_clean::{clean, CleanOptions};
pub use cbuild_install::{install, locate_package_output, InstallResult};
