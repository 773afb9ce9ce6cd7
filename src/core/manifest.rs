//! Cbuild.toml manifest parsing and schema.
//!
//! A manifest lists the extension modules to build plus the batch-wide
//! settings that apply to all of them:
//!
//! ```toml
//! [build]
//! arch = "x86_64"
//! define-macros = ["NDEBUG", "VERSION=2"]
//! include-dirs = ["include"]
//!
//! [[extension]]
//! name = "pkg.fast"
//! sources = ["src/fast.c", "src/kernels.f90"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::errors::{BuildError, Result};
use crate::core::extension::{ExtensionDescriptor, MacroDef};
use crate::util::fs::glob_files;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Cbuild.toml";

/// Default root for intermediate object files, relative to the manifest.
pub const DEFAULT_TEMP_DIR: &str = "build/cb_temp";

/// Default root for finished extension modules, relative to the manifest.
pub const DEFAULT_FINAL_DIR: &str = "build/lib";

/// Batch-wide settings from the `[build]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildSection {
    /// Architecture tag for every module (defaults to the host)
    pub arch: Option<String>,

    /// Macros applied to every compile
    pub define_macros: Vec<MacroDef>,

    /// Include directories applied to every compile
    pub include_dirs: Vec<PathBuf>,

    /// Library search directories applied to every link
    pub lib_dirs: Vec<PathBuf>,

    /// Root for object files
    pub temp_dir: Option<PathBuf>,

    /// Root for finished modules
    pub final_dir: Option<PathBuf>,
}

/// Packaging commands from the `[package]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageSection {
    /// Command producing the packaging output directory (e.g. `python3 setup.py build`)
    pub build_command: Option<Vec<String>>,

    /// Command installing the packaged output
    pub install_command: Option<Vec<String>>,

    /// Directory the packaging tool writes into
    pub build_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawManifest {
    #[serde(default)]
    build: BuildSection,

    #[serde(default)]
    package: PackageSection,

    #[serde(default, rename = "extension")]
    extensions: Vec<ExtensionDescriptor>,
}

/// The parsed Cbuild.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub build: BuildSection,
    pub package: PackageSection,
    pub extensions: Vec<ExtensionDescriptor>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

impl Manifest {
    /// Load and validate a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let manifest_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&contents, path, manifest_dir)
    }

    /// Parse manifest contents. `path` is only used in error messages.
    pub fn parse(contents: &str, path: &Path, manifest_dir: PathBuf) -> Result<Self> {
        let raw: RawManifest = toml::from_str(contents).map_err(|e| BuildError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut manifest = Manifest {
            build: raw.build,
            package: raw.package,
            extensions: raw.extensions,
            manifest_dir,
        };
        manifest.expand_source_globs()?;
        manifest.validate(path)?;
        Ok(manifest)
    }

    /// Expand glob patterns in extension sources, keeping literal paths as-is.
    fn expand_source_globs(&mut self) -> Result<()> {
        for ext in &mut self.extensions {
            let mut sources = Vec::with_capacity(ext.sources.len());
            for source in &ext.sources {
                let text = source.to_string_lossy();
                if text.contains(['*', '?', '[']) {
                    let matched = glob_files(&self.manifest_dir, &[text.into_owned()])?;
                    for path in matched {
                        let relative = match path.strip_prefix(&self.manifest_dir) {
                            Ok(rel) => rel.to_path_buf(),
                            Err(_) => path.clone(),
                        };
                        sources.push(relative);
                    }
                } else {
                    sources.push(source.clone());
                }
            }
            ext.sources = sources;
        }
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: String| BuildError::Manifest {
            path: path.to_path_buf(),
            message,
        };

        let mut seen = std::collections::HashSet::new();
        for ext in &self.extensions {
            if ext.name.is_empty() || ext.name.split('.').any(str::is_empty) {
                return Err(invalid(format!("invalid extension name `{}`", ext.name)));
            }
            if !seen.insert(ext.name.as_str()) {
                return Err(invalid(format!("duplicate extension `{}`", ext.name)));
            }
            if ext.sources.is_empty() {
                return Err(invalid(format!("extension `{}` has no sources", ext.name)));
            }
        }
        Ok(())
    }

    /// Resolve the temp root against the manifest directory.
    pub fn temp_dir(&self) -> PathBuf {
        self.manifest_dir.join(
            self.build
                .temp_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_DIR)),
        )
    }

    /// Resolve the final root against the manifest directory.
    pub fn final_dir(&self) -> PathBuf {
        self.manifest_dir.join(
            self.build
                .final_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FINAL_DIR)),
        )
    }

    /// Directory the packaging tool writes its `lib.*` output into.
    pub fn package_build_dir(&self) -> PathBuf {
        self.manifest_dir.join(
            self.package
                .build_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("build")),
        )
    }
}

/// Find Cbuild.toml by walking up from `start`.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(contents: &str) -> Result<Manifest> {
        Manifest::parse(contents, Path::new(MANIFEST_NAME), PathBuf::from("/proj"))
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse(
            r#"
[build]
arch = "arm64"
define-macros = ["NDEBUG", "VERSION=2"]
include-dirs = ["include"]
lib-dirs = ["/opt/lib"]

[package]
install-command = ["python3", "setup.py", "install", "--skip-build"]

[[extension]]
name = "pkg.a"
sources = ["a.c"]

[[extension]]
name = "pkg.b"
sources = ["a.c", "b.cpp"]
link-libraries = ["m"]
"#,
        )
        .unwrap();

        assert_eq!(manifest.build.arch.as_deref(), Some("arm64"));
        assert_eq!(
            manifest.build.define_macros,
            vec![MacroDef::flag("NDEBUG"), MacroDef::with_value("VERSION", "2")]
        );
        assert_eq!(manifest.extensions.len(), 2);
        assert!(!manifest.extensions[0].is_customized());
        assert_eq!(manifest.extensions[1].link_libraries(), ["m".to_string()]);
        assert_eq!(manifest.temp_dir(), PathBuf::from("/proj/build/cb_temp"));
        assert_eq!(manifest.final_dir(), PathBuf::from("/proj/build/lib"));
        assert_eq!(
            manifest.package.install_command.as_deref().map(|c| c.len()),
            Some(4)
        );
    }

    #[test]
    fn test_empty_optional_list_is_kept() {
        let manifest = parse(
            r#"
[[extension]]
name = "pkg.a"
sources = ["a.c"]
include-dirs = []
"#,
        )
        .unwrap();
        assert!(manifest.extensions[0].is_customized());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = parse(
            r#"
[[extension]]
name = "pkg.a"
sources = ["a.c"]

[[extension]]
name = "pkg.a"
sources = ["b.c"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate extension `pkg.a`"));
    }

    #[test]
    fn test_rejects_bad_names_and_empty_sources() {
        let err = parse("[[extension]]\nname = \"pkg..a\"\nsources = [\"a.c\"]\n").unwrap_err();
        assert!(err.to_string().contains("invalid extension name"));

        let err = parse("[[extension]]\nname = \"pkg.a\"\nsources = []\n").unwrap_err();
        assert!(err.to_string().contains("has no sources"));
    }

    #[test]
    fn test_source_globs_expand_relative_to_manifest() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("b.c"), "").unwrap();
        std::fs::write(src.join("a.c"), "").unwrap();
        std::fs::write(
            tmp.path().join(MANIFEST_NAME),
            "[[extension]]\nname = \"pkg.a\"\nsources = [\"src/*.c\", \"extra.f90\"]\n",
        )
        .unwrap();

        let manifest = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap();
        assert_eq!(
            manifest.extensions[0].sources,
            vec![
                PathBuf::from("src/a.c"),
                PathBuf::from("src/b.c"),
                PathBuf::from("extra.f90")
            ]
        );
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), "").unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_manifest(&nested), Some(tmp.path().join(MANIFEST_NAME)));
    }
}
