//! Build strategy selection and plan generation.
//!
//! A batch of extension modules is built in one of two modes:
//!
//! - **Separate**: every module gets its own temp directory, compiles all of
//!   its sources and links on its own.
//! - **Common**: all modules share one temp directory. Each distinct source
//!   is compiled once and its object is linked into every module that lists
//!   it. Any recompile relinks the whole batch.
//!
//! Common mode needs more than one module, no per-module includes, macros
//! or link libraries, and no module asking for an architecture other than
//! the batch's, since a shared object can only be compiled under one set of
//! flags.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::builder::command::{compile_command, link_command, CompileInput, LinkInput};
use crate::builder::context::BuildContext;
use crate::builder::errors::{BuildError, Result};
use crate::builder::toolchain::{CommandSpec, LinkerChoice};
use crate::core::extension::{ExtensionDescriptor, MacroDef};
use crate::core::language::{secondary_extension, Language};

/// How a batch shares compiled objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Separate,
    Common,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Separate => "separate",
            BuildMode::Common => "common",
        }
    }
}

/// Pick the build mode for a batch built for `arch`.
pub fn select_mode(extensions: &[ExtensionDescriptor], arch: &str) -> BuildMode {
    let shareable = |e: &ExtensionDescriptor| !e.is_customized() && e.architecture_or(arch) == arch;
    if extensions.len() > 1 && extensions.iter().all(shareable) {
        BuildMode::Common
    } else {
        BuildMode::Separate
    }
}

/// Drop leading `./` so one file always maps to one source.
fn normalize_source(source: &Path) -> PathBuf {
    source
        .components()
        .skip_while(|c| matches!(c, Component::CurDir))
        .collect()
}

/// Turn a `.pyx` source into compilable C or C++.
#[derive(Debug, Clone, Serialize)]
pub struct TranspileUnit {
    pub source: PathBuf,
    pub output: PathBuf,
    pub command: CommandSpec,
}

/// Compile one source into one object file.
#[derive(Debug, Clone, Serialize)]
pub struct CompileUnit {
    pub source: PathBuf,
    pub language: Language,
    pub object: PathBuf,
    /// Modules linking this object
    pub owners: Vec<String>,
    pub command: CommandSpec,
}

/// Link object files into one extension module.
#[derive(Debug, Clone, Serialize)]
pub struct LinkUnit {
    pub extension: String,
    pub objects: Vec<PathBuf>,
    pub target: PathBuf,
    pub linker: LinkerChoice,
    pub command: CommandSpec,
}

/// Steps that share one relink decision.
///
/// Separate mode has one batch per module; common mode has a single batch.
#[derive(Debug, Clone, Serialize)]
pub struct PlanBatch {
    /// Module name, or `common_build` for the shared pool
    pub label: String,
    /// Directories created before any step runs
    pub directories: Vec<PathBuf>,
    pub transpile: Vec<TranspileUnit>,
    pub compile: Vec<CompileUnit>,
    pub link: Vec<LinkUnit>,
}

/// A complete build plan. Built fresh on every invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub mode: BuildMode,
    pub batches: Vec<PlanBatch>,
}

/// A module's sources after transpilation, in listed order.
struct ResolvedSources {
    transpile: Vec<TranspileUnit>,
    /// (compilable source, language), duplicates removed
    sources: Vec<(PathBuf, Language)>,
}

impl BuildPlan {
    /// Plan a batch of extension modules.
    pub fn new(ctx: &BuildContext, extensions: &[ExtensionDescriptor]) -> Result<Self> {
        let mode = select_mode(extensions, &ctx.arch);
        tracing::debug!(
            "planning {} module(s) in {} mode",
            extensions.len(),
            mode.as_str()
        );

        let batches = match mode {
            BuildMode::Separate => extensions
                .iter()
                .map(|ext| plan_separate(ctx, ext))
                .collect::<Result<Vec<_>>>()?,
            BuildMode::Common => vec![plan_common(ctx, extensions)?],
        };

        Ok(BuildPlan { mode, batches })
    }

    /// All compile units, in execution order.
    pub fn compile_units(&self) -> impl Iterator<Item = &CompileUnit> {
        self.batches.iter().flat_map(|b| b.compile.iter())
    }

    /// All link units, in execution order.
    pub fn link_units(&self) -> impl Iterator<Item = &LinkUnit> {
        self.batches.iter().flat_map(|b| b.link.iter())
    }

    pub fn compile_count(&self) -> usize {
        self.compile_units().count()
    }

    pub fn link_count(&self) -> usize {
        self.link_units().count()
    }

    /// Serialize as pretty JSON for inspection.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BuildError::config(format!("failed to serialize build plan: {}", e)))
    }
}

fn resolve_sources(
    ctx: &BuildContext,
    ext: &ExtensionDescriptor,
    transpiled: &mut BTreeSet<PathBuf>,
) -> Result<ResolvedSources> {
    let mut transpile = Vec::new();
    let mut sources: Vec<(PathBuf, Language)> = Vec::new();

    for source in &ext.sources {
        let source = normalize_source(source);
        let lang = Language::detect(&source).ok_or_else(|| BuildError::MissingMetadata {
            path: source.clone(),
            extension: secondary_extension(&source).map(str::to_string),
        })?;

        let (compiled, lang) = if lang.is_transpiled() {
            let output = ctx.transpiler.output_for(&source);
            if transpiled.insert(source.clone()) {
                transpile.push(TranspileUnit {
                    command: ctx.transpiler.command_for(&source),
                    source,
                    output: output.clone(),
                });
            }
            (output, ctx.transpiler.output_language())
        } else {
            (source, lang)
        };

        if !sources.iter().any(|(s, _)| *s == compiled) {
            sources.push((compiled, lang));
        }
    }

    Ok(ResolvedSources { transpile, sources })
}

#[allow(clippy::too_many_arguments)]
fn compile_unit(
    ctx: &BuildContext,
    source: &Path,
    lang: Language,
    object: &Path,
    owners: Vec<String>,
    arch_args: &[String],
    global_includes: &[PathBuf],
    module_macros: &[MacroDef],
    module_includes: &[PathBuf],
) -> Result<CompileUnit> {
    let compiler = ctx
        .toolchain
        .compiler(lang)
        .ok_or_else(|| BuildError::MissingMetadata {
            path: source.to_path_buf(),
            extension: secondary_extension(source).map(str::to_string),
        })?;

    let command = compile_command(&CompileInput {
        compiler,
        global_macros: &ctx.global_macros,
        module_macros,
        arch_args,
        global_includes,
        module_includes,
        object,
        source,
    });

    Ok(CompileUnit {
        source: source.to_path_buf(),
        language: lang,
        object: object.to_path_buf(),
        owners,
        command,
    })
}

fn link_unit(
    ctx: &BuildContext,
    ext: &ExtensionDescriptor,
    sources: &[(PathBuf, Language)],
    objects: &BTreeMap<PathBuf, PathBuf>,
    arch_args: &[String],
) -> LinkUnit {
    let languages: BTreeSet<Language> = sources.iter().map(|(_, lang)| *lang).collect();
    let linker = ctx.toolchain.select_linker(&languages);
    tracing::debug!("{} links with {:?}", ext.name, linker.driver);

    let object_files: Vec<PathBuf> = sources
        .iter()
        .filter_map(|(source, _)| objects.get(source).cloned())
        .collect();
    let target = ctx.layout.final_target(&ext.name);

    let command = link_command(&LinkInput {
        linker: &linker,
        arch_args,
        objects: &object_files,
        lib_dirs: &ctx.lib_dirs,
        libraries: ext.link_libraries(),
        target: &target,
    });

    LinkUnit {
        extension: ext.name.clone(),
        objects: object_files,
        target,
        linker,
        command,
    }
}

fn push_unique(dirs: &mut Vec<PathBuf>, dir: PathBuf) {
    if !dirs.contains(&dir) {
        dirs.push(dir);
    }
}

fn plan_separate(ctx: &BuildContext, ext: &ExtensionDescriptor) -> Result<PlanBatch> {
    let arch = ext.architecture_or(&ctx.arch);
    let arch_args = ctx.toolchain.arch_args(arch);
    let temp_dir = ctx.layout.separate_temp_dir(&ext.name, arch);
    let global_includes = ctx.global_includes();

    let resolved = resolve_sources(ctx, ext, &mut BTreeSet::new())?;
    let objects = ctx
        .layout
        .object_paths(&temp_dir, resolved.sources.iter().map(|(s, _)| s.as_path()));

    let compile = resolved
        .sources
        .iter()
        .map(|(source, lang)| {
            compile_unit(
                ctx,
                source,
                *lang,
                &objects[source],
                vec![ext.name.clone()],
                &arch_args,
                &global_includes,
                ext.define_macros(),
                ext.include_dirs(),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let link = link_unit(ctx, ext, &resolved.sources, &objects, &arch_args);

    let mut directories = Vec::new();
    if let Some(parent) = link.target.parent() {
        push_unique(&mut directories, parent.to_path_buf());
    }
    push_unique(&mut directories, temp_dir);

    Ok(PlanBatch {
        label: ext.name.clone(),
        directories,
        transpile: resolved.transpile,
        compile,
        link: vec![link],
    })
}

fn plan_common(ctx: &BuildContext, extensions: &[ExtensionDescriptor]) -> Result<PlanBatch> {
    let arch_args = ctx.toolchain.arch_args(&ctx.arch);
    let temp_dir = ctx.layout.common_temp_dir(&ctx.arch);
    let global_includes = ctx.global_includes();

    let mut transpiled = BTreeSet::new();
    let mut transpile = Vec::new();
    let mut per_module = Vec::with_capacity(extensions.len());

    // Pool in first-appearance order; owners in batch order.
    let mut pool: Vec<(PathBuf, Language)> = Vec::new();
    let mut owners: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

    for ext in extensions {
        let resolved = resolve_sources(ctx, ext, &mut transpiled)?;
        transpile.extend(resolved.transpile);
        for (source, lang) in &resolved.sources {
            let entry = owners.entry(source.clone()).or_default();
            if entry.is_empty() {
                pool.push((source.clone(), *lang));
            }
            entry.push(ext.name.clone());
        }
        per_module.push(resolved.sources);
    }

    let objects = ctx
        .layout
        .object_paths(&temp_dir, pool.iter().map(|(s, _)| s.as_path()));

    let compile = pool
        .iter()
        .map(|(source, lang)| {
            compile_unit(
                ctx,
                source,
                *lang,
                &objects[source],
                owners.remove(source).unwrap_or_default(),
                &arch_args,
                &global_includes,
                &[],
                &[],
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let link: Vec<LinkUnit> = extensions
        .iter()
        .zip(&per_module)
        .map(|(ext, sources)| link_unit(ctx, ext, sources, &objects, &arch_args))
        .collect();

    let mut directories = Vec::new();
    for unit in &link {
        if let Some(parent) = unit.target.parent() {
            push_unique(&mut directories, parent.to_path_buf());
        }
    }
    push_unique(&mut directories, temp_dir);

    Ok(PlanBatch {
        label: "common_build".to_string(),
        directories,
        transpile,
        compile,
        link,
    })
}
