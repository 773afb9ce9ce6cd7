//! Compile and link command assembly.
//!
//! Pure argument construction: nothing here touches the filesystem or
//! spawns processes.

use std::path::{Path, PathBuf};

use crate::builder::toolchain::{CommandSpec, LinkerChoice};
use crate::core::extension::MacroDef;

/// Input for a compile command.
#[derive(Debug, Clone)]
pub struct CompileInput<'a> {
    /// Base compiler invocation
    pub compiler: &'a CommandSpec,
    pub global_macros: &'a [MacroDef],
    pub module_macros: &'a [MacroDef],
    pub arch_args: &'a [String],
    pub global_includes: &'a [PathBuf],
    pub module_includes: &'a [PathBuf],
    /// Output object file
    pub object: &'a Path,
    /// Source file to compile
    pub source: &'a Path,
}

/// Input for a link command.
#[derive(Debug, Clone)]
pub struct LinkInput<'a> {
    pub linker: &'a LinkerChoice,
    pub arch_args: &'a [String],
    /// Object files in link order
    pub objects: &'a [PathBuf],
    /// Library search paths
    pub lib_dirs: &'a [PathBuf],
    /// Libraries to link (without -l prefix)
    pub libraries: &'a [String],
    /// Output shared library
    pub target: &'a Path,
}

/// `-DNAME=VALUE` / `-DNAME` for each macro, in order.
pub fn macro_args(macros: &[MacroDef]) -> Vec<String> {
    macros.iter().map(MacroDef::to_flag).collect()
}

/// `-I<dir>` for each directory, in order.
pub fn include_args(dirs: &[PathBuf]) -> Vec<String> {
    dirs.iter().map(|d| format!("-I{}", d.display())).collect()
}

/// `<compiler> <macros> <arch> <includes> -o <object> -c <source>`
pub fn compile_command(input: &CompileInput<'_>) -> CommandSpec {
    input
        .compiler
        .clone()
        .args(macro_args(input.global_macros))
        .args(macro_args(input.module_macros))
        .args(input.arch_args.iter().cloned())
        .args(include_args(input.global_includes))
        .args(include_args(input.module_includes))
        .arg("-o")
        .arg(input.object.display().to_string())
        .arg("-c")
        .arg(input.source.display().to_string())
}

/// `<linker> <arch> <runtime libs> <shared flags> <objects> <-L..> <-l..> -o <target>`
///
/// Runtime libraries go before the shared-library flags and the explicit
/// libraries after the objects; linker drivers resolve `-l` left to right.
pub fn link_command(input: &LinkInput<'_>) -> CommandSpec {
    CommandSpec::new(input.linker.program.clone())
        .args(input.arch_args.iter().cloned())
        .args(input.linker.runtime_libs.iter().cloned())
        .args(input.linker.shared_flags.iter().cloned())
        .args(input.objects.iter().map(|o| o.display().to_string()))
        .args(input.lib_dirs.iter().map(|d| format!("-L{}", d.display())))
        .args(input.libraries.iter().map(|l| format!("-l{}", l)))
        .arg("-o")
        .arg(input.target.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{LinkDriver, C_RUNTIME, CXX_RUNTIME};

    #[test]
    fn test_macro_formatting_preserves_order() {
        let macros = vec![MacroDef::with_value("FOO", "1"), MacroDef::flag("BAR")];
        assert_eq!(macro_args(&macros).join(" "), "-DFOO=1 -DBAR");
        assert!(macro_args(&[]).is_empty());
    }

    #[test]
    fn test_include_formatting() {
        let dirs = vec![PathBuf::from("/py/include"), PathBuf::from("include")];
        assert_eq!(include_args(&dirs).join(" "), "-I/py/include -Iinclude");
    }

    #[test]
    fn test_compile_command_order() {
        let cc = CommandSpec::parse("gcc -fPIC").unwrap();
        let arch = vec!["-arch".to_string(), "x86_64".to_string()];
        let cmd = compile_command(&CompileInput {
            compiler: &cc,
            global_macros: &[MacroDef::flag("NDEBUG")],
            module_macros: &[MacroDef::with_value("FOO", "1")],
            arch_args: &arch,
            global_includes: &[PathBuf::from("/py/include")],
            module_includes: &[PathBuf::from("inc")],
            object: Path::new("tmp/srcac.o"),
            source: Path::new("src/a.c"),
        });

        assert_eq!(
            cmd.display(),
            "gcc -fPIC -DNDEBUG -DFOO=1 -arch x86_64 -I/py/include -Iinc -o tmp/srcac.o -c src/a.c"
        );
    }

    #[test]
    fn test_link_command_order() {
        let linker = LinkerChoice {
            driver: LinkDriver::Fortran,
            program: PathBuf::from("gfortran"),
            shared_flags: vec!["-shared".to_string()],
            runtime_libs: vec![C_RUNTIME.to_string(), CXX_RUNTIME.to_string()],
        };
        let objects = vec![PathBuf::from("t/kf90.o"), PathBuf::from("t/bcpp.o")];
        let cmd = link_command(&LinkInput {
            linker: &linker,
            arch_args: &[],
            objects: &objects,
            lib_dirs: &[PathBuf::from("/opt/lib")],
            libraries: &["m".to_string()],
            target: Path::new("build/lib/pkg/b.so"),
        });

        assert_eq!(cmd.program, PathBuf::from("gfortran"));
        assert_eq!(
            cmd.args,
            vec![
                "-lc",
                "-lstdc++",
                "-shared",
                "t/kf90.o",
                "t/bcpp.o",
                "-L/opt/lib",
                "-lm",
                "-o",
                "build/lib/pkg/b.so"
            ]
        );
    }
}
