//! Output path naming.
//!
//! Every path here is a pure function of the module name, the source path
//! and the architecture tag, so a re-run without changes lands on the same
//! object files and the staleness check stays meaningful.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::util::hash::short_hash;

/// Roots and extensions for build outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Root for intermediate object files
    pub temp_root: PathBuf,
    /// Root for finished extension modules
    pub final_root: PathBuf,
    /// Object file extension, without the dot
    pub object_extension: String,
    /// Shared object extension, without the dot
    pub shared_object_extension: String,
}

impl BuildLayout {
    pub fn new(
        temp_root: impl Into<PathBuf>,
        final_root: impl Into<PathBuf>,
        object_extension: impl Into<String>,
        shared_object_extension: impl Into<String>,
    ) -> Self {
        BuildLayout {
            temp_root: temp_root.into(),
            final_root: final_root.into(),
            object_extension: object_extension.into(),
            shared_object_extension: shared_object_extension.into(),
        }
    }

    /// `pkg.sub.mod` -> `<final>/pkg/sub/mod.<so>`
    pub fn final_target(&self, name: &str) -> PathBuf {
        let mut segments: Vec<&str> = name.split('.').collect();
        let leaf = segments.pop().unwrap_or(name);
        let mut path = self.final_root.clone();
        for segment in segments {
            path.push(segment);
        }
        path.push(format!("{}.{}", leaf, self.shared_object_extension));
        path
    }

    /// `pkg.mod` + `x86_64` -> `<temp>/pkgmodx86_64`
    pub fn separate_temp_dir(&self, name: &str, arch: &str) -> PathBuf {
        self.temp_root
            .join(format!("{}{}", name.replace('.', ""), arch))
    }

    /// `<temp>/common_build<arch>`, shared by the whole batch.
    pub fn common_temp_dir(&self, arch: &str) -> PathBuf {
        self.temp_root.join(format!("common_build{}", arch))
    }

    /// Flat object file name for a source: separators and dots removed.
    ///
    /// `src/a.c` -> `srcac.o`
    pub fn object_name(&self, source: &Path) -> String {
        format!("{}.{}", flatten(source), self.object_extension)
    }

    /// Object paths for a set of sources sharing one temp directory.
    ///
    /// Distinct sources that flatten to the same name get a short hash of
    /// their path appended, so no two sources share an object file.
    pub fn object_paths<'a>(
        &self,
        temp_dir: &Path,
        sources: impl IntoIterator<Item = &'a Path>,
    ) -> BTreeMap<PathBuf, PathBuf> {
        let unique: BTreeSet<&Path> = sources.into_iter().collect();

        let mut by_name: BTreeMap<String, Vec<&Path>> = BTreeMap::new();
        for source in unique.iter().copied() {
            by_name.entry(flatten(source)).or_default().push(source);
        }

        let mut paths = BTreeMap::new();
        for (stem, group) in by_name {
            let collides = group.len() > 1;
            for source in group {
                let file = if collides {
                    let hash = short_hash(&source.to_string_lossy());
                    tracing::debug!(
                        "object name `{}` is shared by several sources; using `{}_{}` for {}",
                        stem,
                        stem,
                        hash,
                        source.display()
                    );
                    format!("{}_{}.{}", stem, hash, self.object_extension)
                } else {
                    format!("{}.{}", stem, self.object_extension)
                };
                paths.insert(source.to_path_buf(), temp_dir.join(file));
            }
        }
        paths
    }
}

fn flatten(source: &Path) -> String {
    source
        .to_string_lossy()
        .chars()
        .filter(|c| *c != '.' && *c != '/' && *c != MAIN_SEPARATOR)
        .collect()
}
