//! Implementation of `cbuild build`.

use std::path::PathBuf;

use crate::builder::context::default_arch;
use crate::builder::executor::{BuildExecutor, BuildReport, CommandRunner, ProcessRunner};
use crate::builder::host::{HostRuntime, PythonHost};
use crate::builder::toolchain::{resolve_toolchain, Toolchain, ToolchainKind};
use crate::builder::{BuildContext, BuildError, BuildPlan, Result, Transpiler};
use crate::core::extension::{ExtensionDescriptor, MacroDef};
use crate::core::manifest::Manifest;
use crate::util::config::Config;

/// Default host interpreter.
pub const DEFAULT_PYTHON: &str = "python3";

/// Options for the build command.
///
/// Command-line values are appended after the manifest's, so a later `-D`
/// overrides an earlier one at the compiler.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Architecture tag (overrides manifest and config)
    pub arch: Option<String>,

    /// Extra global macros
    pub define_macros: Vec<MacroDef>,

    /// Extra global include directories
    pub include_dirs: Vec<PathBuf>,

    /// Extra library search directories
    pub lib_dirs: Vec<PathBuf>,

    /// Final root override, used by the packaging wrapper
    pub final_dir: Option<PathBuf>,
}

/// Build a batch of extension modules.
///
/// Plans the batch, then runs every stale step through `runner`. Returns
/// what ran; the first failing command aborts with a typed error.
pub fn build<R: CommandRunner>(
    ctx: &BuildContext,
    extensions: &[ExtensionDescriptor],
    runner: R,
) -> Result<BuildReport> {
    let plan = BuildPlan::new(ctx, extensions)?;
    tracing::debug!(
        "{} compile and {} link step(s) planned",
        plan.compile_count(),
        plan.link_count()
    );
    BuildExecutor::new(&ctx.root, runner).execute(&plan)
}

/// Host runtime described by the configuration.
pub fn host_for(config: &Config) -> PythonHost {
    PythonHost::new(
        config
            .toolchain
            .python
            .clone()
            .unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
    )
}

/// Resolve the toolchain table for a configuration.
pub fn toolchain_for(config: &Config, host: &dyn HostRuntime) -> Result<Toolchain> {
    resolve_toolchain(&config.toolchain, host)
}

/// Host include directory: pinned by config, or queried from the host.
///
/// With fixed compiler names a failed query only warns, since nothing
/// else depends on the host.
fn host_include(config: &Config, host: &dyn HostRuntime) -> Result<Option<PathBuf>> {
    if let Some(dir) = &config.toolchain.include_dir {
        return Ok(Some(dir.clone()));
    }
    match host.include_dir() {
        Ok(dir) => Ok(dir),
        Err(e) if config.toolchain.source.unwrap_or_default() == ToolchainKind::Fixed => {
            tracing::warn!("could not determine host include directory: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Assemble the build context for a manifest.
pub fn build_context(
    manifest: &Manifest,
    config: &Config,
    opts: &BuildOptions,
    host: &dyn HostRuntime,
) -> Result<BuildContext> {
    let toolchain = toolchain_for(config, host)?;

    let transpiler = match &config.toolchain.cython {
        Some(invocation) => Transpiler::new(
            invocation,
            config.toolchain.cython_cplus.unwrap_or(false),
        )?,
        None => Transpiler {
            cplus: config.toolchain.cython_cplus.unwrap_or(false),
            ..Transpiler::default()
        },
    };

    let arch = opts
        .arch
        .clone()
        .or_else(|| manifest.build.arch.clone())
        .or_else(|| config.build.arch.clone())
        .unwrap_or_else(|| default_arch().to_string());
    if arch.is_empty() {
        return Err(BuildError::config("architecture tag must not be empty"));
    }

    let macros = manifest
        .build
        .define_macros
        .iter()
        .chain(&opts.define_macros)
        .cloned()
        .collect();
    let includes = manifest
        .build
        .include_dirs
        .iter()
        .chain(&opts.include_dirs)
        .cloned()
        .collect();
    let lib_dirs = manifest
        .build
        .lib_dirs
        .iter()
        .chain(&opts.lib_dirs)
        .cloned()
        .collect();

    let final_dir = opts.final_dir.clone().unwrap_or_else(|| manifest.final_dir());

    Ok(BuildContext::new(
        toolchain,
        manifest.temp_dir(),
        final_dir,
        manifest.manifest_dir.clone(),
    )
    .with_arch(arch)
    .with_transpiler(transpiler)
    .with_macros(macros)
    .with_host_include(host_include(config, host)?)
    .with_include_dirs(includes)
    .with_lib_dirs(lib_dirs))
}

/// Plan a manifest without running anything.
pub fn plan_manifest(
    manifest: &Manifest,
    config: &Config,
    opts: &BuildOptions,
    host: &dyn HostRuntime,
) -> Result<BuildPlan> {
    let ctx = build_context(manifest, config, opts, host)?;
    BuildPlan::new(&ctx, &manifest.extensions)
}

/// Build every extension in a manifest with real processes.
pub fn build_manifest(
    manifest: &Manifest,
    config: &Config,
    opts: &BuildOptions,
) -> Result<BuildReport> {
    let host = host_for(config);
    let ctx = build_context(manifest, config, opts, &host)?;
    tracing::info!(
        "building {} extension module(s) for {}",
        manifest.extensions.len(),
        ctx.arch
    );
    build(&ctx, &manifest.extensions, ProcessRunner)
}
