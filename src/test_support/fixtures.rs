//! Test fixtures for common build scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::context::BuildContext;
use crate::builder::toolchain::{ArchFlag, CommandSpec, Toolchain};

/// A toolchain with distinct fake program names.
///
/// `cc-test`, `cxx-test` and `fc-test` compile; `cc-test -shared` and
/// `cxx-test -shared` link. Objects end in `.o`, modules in `.so`.
pub fn test_toolchain() -> Toolchain {
    Toolchain {
        cc: CommandSpec::new("cc-test").arg("-fPIC"),
        cxx: CommandSpec::new("cxx-test").arg("-fPIC"),
        fc: CommandSpec::new("fc-test").arg("-fPIC"),
        ldshared: CommandSpec::new("cc-test").arg("-shared"),
        ldcxxshared: Some(CommandSpec::new("cxx-test").arg("-shared")),
        arch_flag: ArchFlag::Apple,
        object_extension: "o".to_string(),
        shared_object_extension: "so".to_string(),
    }
}

/// Context over [`test_toolchain`] with `tmp/` and `out/` roots and arch
/// `x86_64`.
pub fn test_context(root: impl Into<PathBuf>) -> BuildContext {
    BuildContext::new(test_toolchain(), "tmp", "out", root).with_arch("x86_64")
}

/// A project directory with a manifest and source files.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Cbuild.toml content
    pub manifest: String,
    /// Source files (path relative to project root, content)
    pub sources: Vec<(PathBuf, String)>,
}

impl ProjectFixture {
    pub fn new(manifest: impl Into<String>) -> Self {
        ProjectFixture {
            manifest: manifest.into(),
            sources: Vec::new(),
        }
    }

    /// Two modules sharing `a.c`, eligible for a common build.
    pub fn shared_sources() -> Self {
        ProjectFixture::new(
            r#"[[extension]]
name = "pkg.a"
sources = ["a.c"]

[[extension]]
name = "pkg.b"
sources = ["a.c", "b.cpp"]
"#,
        )
        .with_source("a.c", "int a(void) { return 1; }\n")
        .with_source("b.cpp", "extern \"C\" int b() { return 2; }\n")
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.sources.push((path.into(), content.into()));
        self
    }

    /// Write the fixture under `root`.
    pub fn write_to(&self, root: &Path) -> std::io::Result<()> {
        fs::create_dir_all(root)?;
        fs::write(root.join("Cbuild.toml"), &self.manifest)?;
        for (path, content) in &self.sources {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(full, content)?;
        }
        Ok(())
    }
}
