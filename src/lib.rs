//! cbuild - incremental builds for multi-language native extension modules
//!
//! This crate decides which C, C++, Fortran and Cython sources need
//! recompiling, assembles the compiler and linker command lines for each
//! toolchain, and shares object files between extension modules when the
//! batch allows it.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and fakes for cbuild unit tests.
///
/// Only compiled for `cfg(test)`. Provides a recording command runner and
/// toolchain fixtures so planning and execution can be tested without a
/// real compiler.
#[cfg(test)]
pub mod test_support;

pub use builder::errors::{BuildError, Result};
pub use core::{ExtensionDescriptor, Language, MacroDef, Manifest};
pub use ops::{build, BuildOptions};
pub use util::context::GlobalContext;
