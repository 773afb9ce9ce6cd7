//! Toolchain sources and resolution.
//!
//! Base compiler names come from one of two strategies:
//! 1. Fixed names (`gcc`, `g++`, `gfortran`)
//! 2. The host interpreter's build configuration (`CC`, `LDSHARED`, ...)
//!
//! Config file and environment overrides are applied on top of either.

use crate::builder::errors::{BuildError, Result};
use crate::builder::host::HostRuntime;
use crate::core::language::Language;
use crate::util::config::ToolchainSettings;

use super::{ArchFlag, CommandSpec, Toolchain, ToolchainKind};

/// Shared-library link flags for the host platform.
fn default_shared_flags() -> &'static str {
    if cfg!(target_os = "macos") {
        "-bundle -undefined dynamic_lookup"
    } else {
        "-shared"
    }
}

/// Supplies base compiler and linker invocation strings.
pub trait ToolchainSource {
    /// Compiler invocation for a compiled language.
    fn compiler_for(&self, lang: Language) -> Result<String>;

    /// `(shared link command, C++ shared link command)`.
    fn linker_defaults(&self) -> Result<(String, Option<String>)>;

    /// Shared object extension, without the dot.
    fn shared_object_extension(&self) -> Result<String>;
}

/// Fixed GNU compiler names.
#[derive(Debug, Clone, Default)]
pub struct FixedToolchain;

impl ToolchainSource for FixedToolchain {
    fn compiler_for(&self, lang: Language) -> Result<String> {
        match lang {
            Language::C => Ok("gcc -fPIC".to_string()),
            Language::Cxx => Ok("g++ -fPIC".to_string()),
            Language::Fortran => Ok("gfortran -fPIC".to_string()),
            Language::Cython => Err(BuildError::config("cython sources are transpiled, not compiled")),
        }
    }

    fn linker_defaults(&self) -> Result<(String, Option<String>)> {
        let flags = default_shared_flags();
        Ok((format!("gcc {}", flags), Some(format!("g++ {}", flags))))
    }

    fn shared_object_extension(&self) -> Result<String> {
        Ok("so".to_string())
    }
}

/// Compilers and linkers the host interpreter was built with.
pub struct SysconfigToolchain<'a> {
    host: &'a dyn HostRuntime,
}

impl<'a> SysconfigToolchain<'a> {
    pub fn new(host: &'a dyn HostRuntime) -> Self {
        SysconfigToolchain { host }
    }

    fn required(&self, name: &str) -> Result<String> {
        self.host
            .config_var(name)?
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                BuildError::config(format!("host configuration does not define `{}`", name))
            })
    }

    fn with_ccshared(&self, base: String) -> Result<String> {
        Ok(match self.host.config_var("CCSHARED")? {
            Some(flags) if !flags.trim().is_empty() => format!("{} {}", base, flags),
            _ => base,
        })
    }
}

impl ToolchainSource for SysconfigToolchain<'_> {
    fn compiler_for(&self, lang: Language) -> Result<String> {
        match lang {
            Language::C => self.with_ccshared(self.required("CC")?),
            Language::Cxx => self.with_ccshared(self.required("CXX")?),
            // The host is never built with a Fortran compiler.
            Language::Fortran => self.with_ccshared("gfortran".to_string()),
            Language::Cython => Err(BuildError::config("cython sources are transpiled, not compiled")),
        }
    }

    fn linker_defaults(&self) -> Result<(String, Option<String>)> {
        let ldshared = self.required("LDSHARED")?;
        let ldcxxshared = self
            .host
            .config_var("LDCXXSHARED")?
            .filter(|v| !v.trim().is_empty());
        Ok((ldshared, ldcxxshared))
    }

    fn shared_object_extension(&self) -> Result<String> {
        let suffix = self
            .host
            .config_var("SHLIB_SUFFIX")?
            .unwrap_or_else(|| ".so".to_string());
        Ok(suffix.trim_start_matches('.').to_string())
    }
}

fn parse_invocation(what: &str, invocation: &str) -> Result<CommandSpec> {
    CommandSpec::parse(invocation)
        .ok_or_else(|| BuildError::config(format!("empty {} command", what)))
}

/// Build the immutable toolchain table from settings and the host.
pub fn resolve_toolchain(settings: &ToolchainSettings, host: &dyn HostRuntime) -> Result<Toolchain> {
    let kind = settings.source.unwrap_or_default();
    let fixed = FixedToolchain;
    let sysconfig = SysconfigToolchain::new(host);
    let source: &dyn ToolchainSource = match kind {
        ToolchainKind::Fixed => &fixed,
        ToolchainKind::Sysconfig => &sysconfig,
    };

    let pick = |over: &Option<String>, lang: Language| -> Result<String> {
        match over {
            Some(value) => Ok(value.clone()),
            None => source.compiler_for(lang),
        }
    };
    let cc = pick(&settings.cc, Language::C)?;
    let cxx = pick(&settings.cxx, Language::Cxx)?;
    let fc = pick(&settings.fc, Language::Fortran)?;

    let (default_ld, default_ldcxx) = source.linker_defaults()?;
    let ldshared = settings.ldshared.clone().unwrap_or(default_ld);
    let ldcxxshared = settings.ldcxxshared.clone().or(default_ldcxx);

    let shared_object_extension = match &settings.shlib_suffix {
        Some(suffix) => suffix.trim_start_matches('.').to_string(),
        None => source.shared_object_extension()?,
    };

    let toolchain = Toolchain {
        cc: parse_invocation("C compiler", &cc)?,
        cxx: parse_invocation("C++ compiler", &cxx)?,
        fc: parse_invocation("Fortran compiler", &fc)?,
        ldshared: parse_invocation("shared link", &ldshared)?,
        ldcxxshared: ldcxxshared
            .as_deref()
            .map(|s| parse_invocation("C++ shared link", s))
            .transpose()?,
        arch_flag: settings.arch_flag.unwrap_or_else(ArchFlag::host),
        object_extension: "o".to_string(),
        shared_object_extension,
    };

    tracing::debug!(
        "resolved {:?} toolchain: cc=`{}` cxx=`{}` fc=`{}` ldshared=`{}`",
        kind,
        toolchain.cc,
        toolchain.cxx,
        toolchain.fc,
        toolchain.ldshared
    );
    Ok(toolchain)
}
