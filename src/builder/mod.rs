//! Extension module build engine.
//!
//! This module turns extension descriptors into compile and link commands,
//! decides what is stale and runs the rest.

pub mod command;
pub mod context;
pub mod errors;
pub mod executor;
pub mod freshness;
pub mod host;
pub mod naming;
pub mod plan;
pub mod toolchain;
pub mod transpile;

pub use context::BuildContext;
pub use errors::{BuildError, Result};
pub use executor::{BuildExecutor, BuildReport, CommandRunner, CommandStatus, ProcessRunner};
pub use host::{HostRuntime, PythonHost, StaticHost};
pub use naming::BuildLayout;
pub use plan::{select_mode, BuildMode, BuildPlan};
pub use toolchain::{resolve_toolchain, CommandSpec, LinkDriver, LinkerChoice, Toolchain};
pub use transpile::Transpiler;
