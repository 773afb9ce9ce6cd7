//! Build context - toolchain, layout and batch-wide settings.

use std::path::PathBuf;

use crate::builder::naming::BuildLayout;
use crate::builder::toolchain::Toolchain;
use crate::builder::transpile::Transpiler;
use crate::core::extension::MacroDef;

/// Everything a build needs besides the extension list.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Resolved compiler and linker table
    pub toolchain: Toolchain,

    /// Output roots and extensions
    pub layout: BuildLayout,

    /// Cython transpiler
    pub transpiler: Transpiler,

    /// Directory commands run in; relative sources resolve against it
    pub root: PathBuf,

    /// Architecture tag for the batch
    pub arch: String,

    /// Macros applied to every compile
    pub global_macros: Vec<MacroDef>,

    /// Host runtime include directory, always first on the include path
    pub host_include: Option<PathBuf>,

    /// Include directories applied to every compile
    pub include_dirs: Vec<PathBuf>,

    /// Library search directories applied to every link
    pub lib_dirs: Vec<PathBuf>,
}

impl BuildContext {
    /// Create a context with no global macros, includes or library dirs.
    ///
    /// The layout's extensions follow the toolchain.
    pub fn new(
        toolchain: Toolchain,
        temp_root: impl Into<PathBuf>,
        final_root: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
    ) -> Self {
        let layout = BuildLayout::new(
            temp_root,
            final_root,
            toolchain.object_extension.clone(),
            toolchain.shared_object_extension.clone(),
        );
        BuildContext {
            toolchain,
            layout,
            transpiler: Transpiler::default(),
            root: root.into(),
            arch: default_arch().to_string(),
            global_macros: Vec::new(),
            host_include: None,
            include_dirs: Vec::new(),
            lib_dirs: Vec::new(),
        }
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn with_transpiler(mut self, transpiler: Transpiler) -> Self {
        self.transpiler = transpiler;
        self
    }

    pub fn with_macros(mut self, macros: Vec<MacroDef>) -> Self {
        self.global_macros = macros;
        self
    }

    pub fn with_host_include(mut self, dir: Option<PathBuf>) -> Self {
        self.host_include = dir;
        self
    }

    pub fn with_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.include_dirs = dirs;
        self
    }

    pub fn with_lib_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.lib_dirs = dirs;
        self
    }

    /// Global include path: the host include directory, then the rest.
    pub fn global_includes(&self) -> Vec<PathBuf> {
        self.host_include
            .iter()
            .chain(self.include_dirs.iter())
            .cloned()
            .collect()
    }
}

/// Architecture tag of the host.
pub fn default_arch() -> &'static str {
    std::env::consts::ARCH
}
