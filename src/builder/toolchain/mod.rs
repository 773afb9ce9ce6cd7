//! Toolchain table and linker selection.
//!
//! A [`Toolchain`] is an immutable table of compiler and linker invocations,
//! resolved once per build from a [`ToolchainSource`] plus configuration
//! overrides. It answers two questions:
//!
//! - which compiler invocation compiles a given source file
//! - which linker driver and runtime libraries a set of languages needs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::errors::{BuildError, Result};
use crate::core::language::{secondary_extension, Language};

mod detect;

pub use detect::{resolve_toolchain, FixedToolchain, SysconfigToolchain, ToolchainSource};

/// Runtime library flag for C, needed when Fortran drives a C++ link.
pub const C_RUNTIME: &str = "-lc";

/// Runtime library flag for C++.
pub const CXX_RUNTIME: &str = "-lstdc++";

/// A command to execute: program plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Split a whitespace-separated invocation such as `"gcc -fPIC -O2"`.
    ///
    /// Returns `None` for a blank string. Quoting is not interpreted.
    pub fn parse(invocation: &str) -> Option<Self> {
        let mut tokens = invocation.split_whitespace();
        let program = tokens.next()?;
        Some(CommandSpec::new(program).args(tokens))
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Flatten to a single display string.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Where the base compiler names come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// Fixed names: gcc, g++, gfortran
    #[default]
    Fixed,
    /// Query the host interpreter's build configuration
    Sysconfig,
}

/// How the architecture tag reaches the compiler and linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchFlag {
    /// `-arch <tag>` (Apple toolchains)
    Apple,
    /// The tag only namespaces paths
    None,
}

impl ArchFlag {
    /// Default for the host platform.
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            ArchFlag::Apple
        } else {
            ArchFlag::None
        }
    }

    /// Arguments for an architecture tag.
    pub fn args(&self, arch: &str) -> Vec<String> {
        match self {
            ArchFlag::Apple if !arch.is_empty() => vec!["-arch".to_string(), arch.to_string()],
            _ => Vec::new(),
        }
    }
}

/// The compiler driver that performs a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDriver {
    C,
    Cxx,
    Fortran,
}

/// Result of linker selection for one link unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerChoice {
    pub driver: LinkDriver,
    /// Program performing the link
    pub program: PathBuf,
    /// Shared-library linking flags, placed after the runtime libraries
    pub shared_flags: Vec<String>,
    /// Extra runtime libraries, placed before the shared flags
    pub runtime_libs: Vec<String>,
}

/// Immutable compiler and linker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    pub cc: CommandSpec,
    pub cxx: CommandSpec,
    pub fc: CommandSpec,
    /// Shared-library link command for C
    pub ldshared: CommandSpec,
    /// Shared-library link command for C++, if the platform has one
    pub ldcxxshared: Option<CommandSpec>,
    pub arch_flag: ArchFlag,
    /// Object file extension, without the dot
    pub object_extension: String,
    /// Shared object extension, without the dot
    pub shared_object_extension: String,
}

impl Toolchain {
    /// Compiler invocation for a language.
    ///
    /// Cython has no compiler of its own; it is transpiled first.
    pub fn compiler(&self, lang: Language) -> Option<&CommandSpec> {
        match lang {
            Language::C => Some(&self.cc),
            Language::Cxx => Some(&self.cxx),
            Language::Fortran => Some(&self.fc),
            Language::Cython => None,
        }
    }

    /// Detect the language of `source` and return its compiler.
    pub fn compiler_for(&self, source: &Path) -> Result<(Language, &CommandSpec)> {
        let missing = || BuildError::MissingMetadata {
            path: source.to_path_buf(),
            extension: secondary_extension(source).map(str::to_string),
        };
        let lang = Language::detect(source).ok_or_else(missing)?;
        let compiler = self.compiler(lang).ok_or_else(missing)?;
        Ok((lang, compiler))
    }

    /// Choose the link driver and runtime libraries for a set of languages.
    ///
    /// - C only: the C shared-link command.
    /// - Any C++: the C++ shared-link command, or the C one plus the C++
    ///   runtime when the platform has none.
    /// - Any Fortran: the Fortran compiler drives the link with the C link
    ///   command's flags. Fortran does not pull in the C++ runtime, so with
    ///   C++ present both the C and C++ runtimes are added. Fortran always
    ///   wins over C++.
    pub fn select_linker(&self, languages: &BTreeSet<Language>) -> LinkerChoice {
        let has_cxx = languages.contains(&Language::Cxx);
        let has_fortran = languages.contains(&Language::Fortran);

        if has_fortran {
            let runtime_libs = if has_cxx {
                vec![C_RUNTIME.to_string(), CXX_RUNTIME.to_string()]
            } else {
                Vec::new()
            };
            return LinkerChoice {
                driver: LinkDriver::Fortran,
                program: self.fc.program.clone(),
                shared_flags: self.ldshared.args.clone(),
                runtime_libs,
            };
        }

        if has_cxx {
            return match &self.ldcxxshared {
                Some(ldcxx) => LinkerChoice {
                    driver: LinkDriver::Cxx,
                    program: ldcxx.program.clone(),
                    shared_flags: ldcxx.args.clone(),
                    runtime_libs: Vec::new(),
                },
                None => LinkerChoice {
                    driver: LinkDriver::C,
                    program: self.ldshared.program.clone(),
                    shared_flags: self.ldshared.args.clone(),
                    runtime_libs: vec![CXX_RUNTIME.to_string()],
                },
            };
        }

        LinkerChoice {
            driver: LinkDriver::C,
            program: self.ldshared.program.clone(),
            shared_flags: self.ldshared.args.clone(),
            runtime_libs: Vec::new(),
        }
    }

    /// Architecture arguments for compile and link commands.
    pub fn arch_args(&self, arch: &str) -> Vec<String> {
        self.arch_flag.args(arch)
    }
}
