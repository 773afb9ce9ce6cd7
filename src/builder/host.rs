//! Host runtime queries.
//!
//! Extension modules are compiled against a host interpreter. The host
//! supplies its own include directory and, for the sysconfig toolchain, the
//! compiler and linker invocations it was built with.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::builder::errors::{BuildError, Result};
use crate::util::process::ProcessBuilder;

/// Configuration variables read from the host.
pub const HOST_CONFIG_VARS: [&str; 6] = [
    "CC",
    "CXX",
    "CCSHARED",
    "LDSHARED",
    "LDCXXSHARED",
    "SHLIB_SUFFIX",
];

/// Python snippet printing `{"include": ..., "vars": {...}}` as JSON.
fn query_script() -> String {
    format!(
        "import json, sysconfig\n\
         names = {:?}\n\
         print(json.dumps({{'include': sysconfig.get_paths().get('include'), \
         'vars': {{n: sysconfig.get_config_var(n) for n in names}}}}))\n",
        HOST_CONFIG_VARS
    )
}

/// Information about the host runtime.
pub trait HostRuntime {
    /// The host's C header directory, prepended to every include list.
    fn include_dir(&self) -> Result<Option<PathBuf>>;

    /// A build configuration variable such as `LDSHARED`.
    fn config_var(&self, name: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
struct HostInfo {
    include: Option<PathBuf>,
    #[serde(default)]
    vars: BTreeMap<String, Option<serde_json::Value>>,
}

/// Queries a Python interpreter's `sysconfig` once and caches the answer.
#[derive(Debug)]
pub struct PythonHost {
    interpreter: String,
    info: OnceCell<HostInfo>,
}

impl PythonHost {
    pub fn new(interpreter: impl Into<String>) -> Self {
        PythonHost {
            interpreter: interpreter.into(),
            info: OnceCell::new(),
        }
    }

    fn info(&self) -> Result<&HostInfo> {
        if let Some(info) = self.info.get() {
            return Ok(info);
        }

        let cmd = ProcessBuilder::new(&self.interpreter)
            .arg("-c")
            .arg(query_script());
        tracing::debug!("querying host configuration with `{}`", self.interpreter);
        let output = cmd.exec()?;
        if !output.status.success() {
            return Err(BuildError::config(format!(
                "host query `{}` failed: {}",
                self.interpreter,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let info: HostInfo = serde_json::from_slice(&output.stdout).map_err(|e| {
            BuildError::config(format!(
                "unexpected output from host query `{}`: {}",
                self.interpreter, e
            ))
        })?;
        Ok(self.info.get_or_init(|| info))
    }
}

impl HostRuntime for PythonHost {
    fn include_dir(&self) -> Result<Option<PathBuf>> {
        Ok(self.info()?.include.clone())
    }

    fn config_var(&self, name: &str) -> Result<Option<String>> {
        let value = self.info()?.vars.get(name).cloned().flatten();
        Ok(value.and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }))
    }
}

/// A host described up front, for configs that pin the include directory
/// and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    pub include: Option<PathBuf>,
    pub vars: BTreeMap<String, String>,
}

impl StaticHost {
    pub fn with_include(include: impl Into<PathBuf>) -> Self {
        StaticHost {
            include: Some(include.into()),
            vars: BTreeMap::new(),
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl HostRuntime for StaticHost {
    fn include_dir(&self) -> Result<Option<PathBuf>> {
        Ok(self.include.clone())
    }

    fn config_var(&self, name: &str) -> Result<Option<String>> {
        Ok(self.vars.get(name).cloned())
    }
}
