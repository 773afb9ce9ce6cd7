//! Source languages and extension detection.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Language of a single source file, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C (`.c`)
    C,
    /// C++ (`.cpp`)
    #[serde(alias = "cpp", alias = "c++")]
    Cxx,
    /// Fortran 90 (`.f90`)
    #[serde(alias = "f90")]
    Fortran,
    /// Cython (`.pyx`), transpiled to C or C++ before compilation
    #[serde(alias = "pyx")]
    Cython,
}

impl Language {
    /// All languages, in table order.
    pub const ALL: [Language; 4] = [
        Language::C,
        Language::Cxx,
        Language::Fortran,
        Language::Cython,
    ];

    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
            Language::Fortran => "fortran",
            Language::Cython => "cython",
        }
    }

    /// The file extension this language is keyed on.
    pub fn extension(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "cpp",
            Language::Fortran => "f90",
            Language::Cython => "pyx",
        }
    }

    /// Look up a language by its extension key.
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "c" => Some(Language::C),
            "cpp" => Some(Language::Cxx),
            "f90" => Some(Language::Fortran),
            "pyx" => Some(Language::Cython),
            _ => None,
        }
    }

    /// Detect the language of a source path.
    pub fn detect(path: &Path) -> Option<Language> {
        secondary_extension(path).and_then(Language::from_extension)
    }

    /// Whether sources of this language must be transpiled before compiling.
    pub fn is_transpiled(&self) -> bool {
        matches!(self, Language::Cython)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The segment of the file name after its first `.`.
///
/// `src/mod.c` gives `c`, `wrap.tar.cpp` gives `tar`. Files without a dot
/// have no extension.
pub fn secondary_extension(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let ext = name.split('.').nth(1)?;
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}
