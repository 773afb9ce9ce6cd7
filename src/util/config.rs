//! Configuration file support for cbuild.
//!
//! cbuild reads two configuration files:
//! - Global: `~/.cbuild/config.toml` - user-wide defaults
//! - Project: `.cbuild/config.toml` next to Cbuild.toml - project overrides
//!
//! Project config takes precedence over global config, field by field.
//!
//! ```toml
//! [toolchain]
//! source = "sysconfig"
//! fc = "gfortran -O2"
//! arch-flag = "apple"
//!
//! [build]
//! arch = "arm64"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::errors::{BuildError, Result};
use crate::builder::toolchain::{ArchFlag, ToolchainKind};

/// cbuild configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Toolchain selection and overrides
    pub toolchain: ToolchainSettings,

    /// Build defaults
    pub build: BuildDefaults,
}

/// Toolchain settings. Every compiler/linker entry is a full invocation
/// string, e.g. `"gcc -fPIC -O2"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolchainSettings {
    /// Where base compiler names come from (fixed names or host sysconfig)
    pub source: Option<ToolchainKind>,

    /// C compiler invocation
    pub cc: Option<String>,

    /// C++ compiler invocation
    pub cxx: Option<String>,

    /// Fortran 90 compiler invocation
    pub fc: Option<String>,

    /// Shared-library link command for C
    pub ldshared: Option<String>,

    /// Shared-library link command for C++
    pub ldcxxshared: Option<String>,

    /// Shared object extension, without the dot
    pub shlib_suffix: Option<String>,

    /// Host interpreter used for sysconfig and include-dir queries
    pub python: Option<String>,

    /// Host include directory; skips the interpreter query when set
    pub include_dir: Option<PathBuf>,

    /// Cython transpiler program
    pub cython: Option<String>,

    /// Transpile Cython to C++ instead of C
    pub cython_cplus: Option<bool>,

    /// How the architecture tag is passed to compilers
    pub arch_flag: Option<ArchFlag>,
}

/// Build defaults that apply when the manifest is silent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildDefaults {
    /// Default architecture tag
    pub arch: Option<String>,
}

macro_rules! take_some {
    ($dst:expr, $src:expr, $($field:ident),+) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field;
            }
        )+
    };
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;

        toml::from_str(&contents).map_err(|e| {
            BuildError::config(format!(
                "failed to parse config {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let (dst, src) = (&mut self.toolchain, other.toolchain);
        take_some!(
            dst,
            src,
            source,
            cc,
            cxx,
            fc,
            ldshared,
            ldcxxshared,
            shlib_suffix,
            python,
            include_dir,
            cython,
            cython_cplus,
            arch_flag
        );
        take_some!(self.build, other.build, arch);
    }

    /// Apply compiler overrides from the environment (`CC`, `CXX`, `FC`,
    /// `LDSHARED`, `LDCXXSHARED`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let tc = &mut self.toolchain;
        for (var, slot) in [
            ("CC", &mut tc.cc),
            ("CXX", &mut tc.cxx),
            ("FC", &mut tc.fc),
            ("LDSHARED", &mut tc.ldshared),
            ("LDCXXSHARED", &mut tc.ldcxxshared),
        ] {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.cbuild/config.toml)
/// 2. Global config (~/.cbuild/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global cbuild config directory (~/.cbuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".cbuild"))
}

/// Get the global config path (~/.cbuild/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.cbuild/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".cbuild").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
[toolchain]
source = "fixed"
cc = "clang -O2"
cython-cplus = true
arch-flag = "apple"

[build]
arch = "arm64"
"#,
        )
        .unwrap();

        assert_eq!(config.toolchain.source, Some(ToolchainKind::Fixed));
        assert_eq!(config.toolchain.cc.as_deref(), Some("clang -O2"));
        assert_eq!(config.toolchain.cython_cplus, Some(true));
        assert_eq!(config.toolchain.arch_flag, Some(ArchFlag::Apple));
        assert_eq!(config.build.arch.as_deref(), Some("arm64"));
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(&global, "[toolchain]\ncc = \"gcc\"\nfc = \"gfortran\"\n").unwrap();
        std::fs::write(&project, "[toolchain]\ncc = \"clang\"\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.toolchain.cc.as_deref(), Some("clang"));
        assert_eq!(config.toolchain.fc.as_deref(), Some("gfortran"));
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[toolchain\n").unwrap();

        let config = Config::load_or_default(&path);
        assert!(config.toolchain.cc.is_none());
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.toolchain.cc = Some("gcc".to_string());
        config.apply_env(|var| match var {
            "CC" => Some("clang".to_string()),
            "FC" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.toolchain.cc.as_deref(), Some("clang"));
        assert!(config.toolchain.fc.is_none());
    }
}
