//! Cython transpilation.
//!
//! `.pyx` sources are turned into C (or C++) next to the original file, then
//! compiled like any other source. The transpiler itself is a black box.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::errors::{BuildError, Result};
use crate::builder::toolchain::CommandSpec;
use crate::core::language::Language;

/// Source-to-source transpiler for Cython.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transpiler {
    /// Base invocation, e.g. `cython -3`
    pub command: CommandSpec,
    /// Emit C++ instead of C
    pub cplus: bool,
}

impl Default for Transpiler {
    fn default() -> Self {
        Transpiler {
            command: CommandSpec::new("cython"),
            cplus: false,
        }
    }
}

impl Transpiler {
    /// Create a transpiler from an invocation string.
    pub fn new(invocation: &str, cplus: bool) -> Result<Self> {
        let command = CommandSpec::parse(invocation)
            .ok_or_else(|| BuildError::config("empty cython command"))?;
        Ok(Transpiler { command, cplus })
    }

    /// Language of the generated source.
    pub fn output_language(&self) -> Language {
        if self.cplus {
            Language::Cxx
        } else {
            Language::C
        }
    }

    /// Where the compilable source for `source` is written.
    pub fn output_for(&self, source: &Path) -> PathBuf {
        source.with_extension(self.output_language().extension())
    }

    /// Command producing [`Transpiler::output_for`] from `source`.
    pub fn command_for(&self, source: &Path) -> CommandSpec {
        let mut cmd = self.command.clone();
        if self.cplus {
            cmd = cmd.arg("--cplus");
        }
        cmd.arg(source.display().to_string())
            .arg("-o")
            .arg(self.output_for(source).display().to_string())
    }
}
