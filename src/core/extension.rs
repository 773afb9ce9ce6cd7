//! Extension module descriptors.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A preprocessor macro: `NAME` or `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacroDef {
    pub name: String,
    pub value: Option<String>,
}

impl MacroDef {
    /// A bare macro with no value.
    pub fn flag(name: impl Into<String>) -> Self {
        MacroDef {
            name: name.into(),
            value: None,
        }
    }

    /// A macro with a value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        MacroDef {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Render as a compiler define flag.
    pub fn to_flag(&self) -> String {
        match &self.value {
            Some(v) => format!("-D{}={}", self.name, v),
            None => format!("-D{}", self.name),
        }
    }
}

impl FromStr for MacroDef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("-D").unwrap_or(s);
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (s, None),
        };
        if name.is_empty() {
            return Err(format!("invalid macro definition `{}`", s));
        }
        Ok(MacroDef {
            name: name.to_string(),
            value,
        })
    }
}

impl std::fmt::Display for MacroDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for MacroDef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacroDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One requested extension module.
///
/// The optional fields are per-module customizations. Setting any of them,
/// even to an empty list, means the module cannot share object files with
/// other modules in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionDescriptor {
    /// Dotted module name, e.g. `pkg.fast`
    pub name: String,

    /// Source files in compile and link order
    pub sources: Vec<PathBuf>,

    /// Architecture tag; filled in from the batch when not set
    #[serde(default)]
    pub architecture: Option<String>,

    #[serde(default)]
    pub include_dirs: Option<Vec<PathBuf>>,

    #[serde(default)]
    pub define_macros: Option<Vec<MacroDef>>,

    #[serde(default)]
    pub link_libraries: Option<Vec<String>>,
}

impl ExtensionDescriptor {
    /// Create a descriptor with no per-module customization.
    pub fn new(
        name: impl Into<String>,
        sources: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        ExtensionDescriptor {
            name: name.into(),
            sources: sources.into_iter().map(Into::into).collect(),
            architecture: None,
            include_dirs: None,
            define_macros: None,
            link_libraries: None,
        }
    }

    pub fn with_include_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.include_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_macros(mut self, macros: impl IntoIterator<Item = MacroDef>) -> Self {
        self.define_macros = Some(macros.into_iter().collect());
        self
    }

    pub fn with_link_libraries(
        mut self,
        libs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.link_libraries = Some(libs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_architecture(mut self, arch: impl Into<String>) -> Self {
        self.architecture = Some(arch.into());
        self
    }

    /// Whether this module carries per-module includes, macros or libraries.
    pub fn is_customized(&self) -> bool {
        self.include_dirs.is_some() || self.define_macros.is_some() || self.link_libraries.is_some()
    }

    /// The architecture tag, falling back to the batch default.
    pub fn architecture_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.architecture.as_deref().unwrap_or(default)
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        self.include_dirs.as_deref().unwrap_or(&[])
    }

    pub fn define_macros(&self) -> &[MacroDef] {
        self.define_macros.as_deref().unwrap_or(&[])
    }

    pub fn link_libraries(&self) -> &[String] {
        self.link_libraries.as_deref().unwrap_or(&[])
    }
}
