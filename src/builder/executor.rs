//! Plan execution.
//!
//! Steps run strictly in order: directories, transpilation, compilation,
//! then linking. The first failing command aborts the build; nothing after
//! it runs and the partial outputs are left on disk.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::errors::{BuildError, Result};
use crate::builder::freshness::is_up_to_date;
use crate::builder::plan::{BuildMode, BuildPlan, PlanBatch};
use crate::builder::toolchain::CommandSpec;
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Exit status of one external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands for the executor.
pub trait CommandRunner {
    /// Run `command` in `cwd`, streaming its output to the user.
    fn run(&mut self, command: &CommandSpec, cwd: &Path) -> Result<CommandStatus>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, command: &CommandSpec, cwd: &Path) -> Result<CommandStatus> {
        let status = ProcessBuilder::new(&command.program)
            .args(&command.args)
            .cwd(cwd)
            .status()?;
        Ok(CommandStatus {
            code: status.code(),
        })
    }
}

/// What a build did.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub mode: BuildMode,
    /// Transpiled `.pyx` sources
    pub transpiled: Vec<PathBuf>,
    /// Compiled sources
    pub compiled: Vec<PathBuf>,
    /// Sources whose objects were already up to date
    pub skipped: Vec<PathBuf>,
    /// Linked extension modules
    pub linked: Vec<PathBuf>,
}

impl BuildReport {
    fn new(mode: BuildMode) -> Self {
        BuildReport {
            mode,
            transpiled: Vec::new(),
            compiled: Vec::new(),
            skipped: Vec::new(),
            linked: Vec::new(),
        }
    }

    /// Whether the build ran no commands at all.
    pub fn is_noop(&self) -> bool {
        self.transpiled.is_empty() && self.compiled.is_empty() && self.linked.is_empty()
    }
}

/// Executes a [`BuildPlan`] against the filesystem.
pub struct BuildExecutor<'a, R: CommandRunner> {
    root: &'a Path,
    runner: R,
}

impl<'a, R: CommandRunner> BuildExecutor<'a, R> {
    /// Create an executor running commands in `root`.
    pub fn new(root: &'a Path, runner: R) -> Self {
        BuildExecutor { root, runner }
    }

    /// Hand back the runner.
    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Execute every batch in order.
    pub fn execute(&mut self, plan: &BuildPlan) -> Result<BuildReport> {
        let mut report = BuildReport::new(plan.mode);
        for batch in &plan.batches {
            self.execute_batch(batch, &mut report)?;
        }
        Ok(report)
    }

    fn execute_batch(&mut self, batch: &PlanBatch, report: &mut BuildReport) -> Result<()> {
        for dir in &batch.directories {
            ensure_dir(&self.root.join(dir))?;
        }

        for unit in &batch.transpile {
            if is_up_to_date(&self.root.join(&unit.output), &self.root.join(&unit.source)) {
                tracing::debug!("{} is already transpiled", unit.source.display());
                continue;
            }
            let status = self.run(&unit.command)?;
            if !status.success() {
                return Err(BuildError::Transpile {
                    command: unit.command.display(),
                    path: unit.source.clone(),
                    code: status.code,
                });
            }
            report.transpiled.push(unit.source.clone());
        }

        let mut compiled_any = false;
        for unit in &batch.compile {
            if is_up_to_date(&self.root.join(&unit.object), &self.root.join(&unit.source)) {
                tracing::info!("skipping {}, it is already up to date", unit.source.display());
                report.skipped.push(unit.source.clone());
                continue;
            }
            let status = self.run(&unit.command)?;
            if !status.success() {
                return Err(BuildError::Compile {
                    command: unit.command.display(),
                    path: unit.source.clone(),
                    code: status.code,
                });
            }
            compiled_any = true;
            report.compiled.push(unit.source.clone());
        }

        let targets_exist = batch
            .link
            .iter()
            .all(|unit| self.root.join(&unit.target).exists());
        if !compiled_any && targets_exist {
            tracing::info!("{}: all modules already up to date", batch.label);
            return Ok(());
        }

        for unit in &batch.link {
            let status = self.run(&unit.command)?;
            if !status.success() {
                return Err(BuildError::Link {
                    command: unit.command.display(),
                    target: unit.target.clone(),
                    code: status.code,
                });
            }
            tracing::info!("built {}", unit.extension);
            report.linked.push(unit.target.clone());
        }

        Ok(())
    }

    fn run(&mut self, command: &CommandSpec) -> Result<CommandStatus> {
        tracing::info!("{}", command);
        self.runner.run(command, self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extension::ExtensionDescriptor;
    use crate::test_support::{age_file, test_context, RecordingRunner};
    use std::fs;
    use tempfile::TempDir;

    fn ext(name: &str, sources: &[&str]) -> ExtensionDescriptor {
        ExtensionDescriptor::new(name, sources.iter().copied())
    }

    fn write_sources(root: &Path, names: &[&str]) {
        for name in names {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, "/* source */\n").unwrap();
            age_file(&path, 60);
        }
    }

    fn run(root: &Path, exts: &[ExtensionDescriptor]) -> (BuildReport, RecordingRunner) {
        let ctx = test_context(root);
        let plan = BuildPlan::new(&ctx, exts).unwrap();
        let mut exec = BuildExecutor::new(root, RecordingRunner::new(root));
        let report = exec.execute(&plan).unwrap();
        (report, exec.into_runner())
    }

    #[test]
    fn test_fresh_build_compiles_and_links() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c"]);

        let (report, runner) = run(tmp.path(), &[ext("pkg.a", &["a.c"])]);
        assert_eq!(report.compiled, vec![PathBuf::from("a.c")]);
        assert_eq!(report.linked, vec![PathBuf::from("out/pkg/a.so")]);
        assert_eq!(runner.programs(), vec!["cc-test", "cc-test"]);
        assert!(tmp.path().join("out/pkg/a.so").exists());
    }

    #[test]
    fn test_second_run_is_noop() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c", "b.cpp"]);
        let exts = [ext("pkg.a", &["a.c"]), ext("pkg.b", &["a.c", "b.cpp"])];

        run(tmp.path(), &exts);
        let (report, runner) = run(tmp.path(), &exts);

        assert!(report.is_noop());
        assert_eq!(report.skipped.len(), 2);
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_common_build_compiles_shared_source_once() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c", "b.cpp"]);

        let (report, runner) = run(
            tmp.path(),
            &[ext("pkg.a", &["a.c"]), ext("pkg.b", &["a.c", "b.cpp"])],
        );

        assert_eq!(report.mode, BuildMode::Common);
        assert_eq!(runner.compiles_of("a.c"), 1);
        assert_eq!(report.linked.len(), 2);

        let links = runner.links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].args.iter().filter(|a| a.ends_with(".o")).count(), 1);
        assert_eq!(links[1].args.iter().filter(|a| a.ends_with(".o")).count(), 2);
    }

    #[test]
    fn test_customized_module_forces_separate_compiles() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c", "b.cpp"]);

        let (report, runner) = run(
            tmp.path(),
            &[
                ext("pkg.a", &["a.c"]),
                ext("pkg.b", &["a.c", "b.cpp"]).with_link_libraries(["m"]),
            ],
        );

        assert_eq!(report.mode, BuildMode::Separate);
        assert_eq!(runner.compiles_of("a.c"), 2);
        let links = runner.links();
        assert!(links[1].args.contains(&"-lm".to_string()));
    }

    #[test]
    fn test_separate_build_relinks_only_touched_module() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c", "b.c"]);
        let exts = [
            ext("pkg.a", &["a.c"]),
            ext("pkg.b", &["b.c"]).with_link_libraries(["m"]),
        ];

        let (first, _) = run(tmp.path(), &exts);
        assert_eq!(first.mode, BuildMode::Separate);
        assert_eq!(first.linked.len(), 2);

        let (report, runner) = run(tmp.path(), &exts);
        assert!(report.is_noop());
        assert!(runner.commands().is_empty());

        age_file(&tmp.path().join("tmp/pkgax86_64/ac.o"), 30);
        age_file(&tmp.path().join("tmp/pkgbx86_64/bc.o"), 30);
        fs::write(tmp.path().join("b.c"), "/* edited */\n").unwrap();

        let (report, runner) = run(tmp.path(), &exts);
        assert_eq!(report.compiled, vec![PathBuf::from("b.c")]);
        assert_eq!(report.skipped, vec![PathBuf::from("a.c")]);
        assert_eq!(report.linked, vec![PathBuf::from("out/pkg/b.so")]);
        assert_eq!(runner.commands().len(), 2);
        assert!(runner.links()[0].args.contains(&"-lm".to_string()));
    }

    #[test]
    fn test_touched_source_recompiles_and_relinks_whole_batch() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c", "b.c"]);
        let exts = [ext("pkg.a", &["a.c"]), ext("pkg.b", &["b.c"])];

        run(tmp.path(), &exts);
        age_file(&tmp.path().join("tmp/common_buildx86_64/ac.o"), 30);
        age_file(&tmp.path().join("tmp/common_buildx86_64/bc.o"), 30);
        fs::write(tmp.path().join("b.c"), "/* edited */\n").unwrap();

        let (report, runner) = run(tmp.path(), &exts);
        assert_eq!(report.compiled, vec![PathBuf::from("b.c")]);
        assert_eq!(report.skipped, vec![PathBuf::from("a.c")]);
        // Any recompile relinks every module in the batch.
        assert_eq!(runner.links().len(), 2);
    }

    #[test]
    fn test_missing_target_relinks_without_compiling() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c"]);
        let exts = [ext("pkg.a", &["a.c"])];

        run(tmp.path(), &exts);
        fs::remove_file(tmp.path().join("out/pkg/a.so")).unwrap();

        let (report, runner) = run(tmp.path(), &exts);
        assert!(report.compiled.is_empty());
        assert_eq!(report.linked.len(), 1);
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_compile_failure_stops_build() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["a.c", "b.cpp"]);

        let ctx = test_context(tmp.path());
        let plan = BuildPlan::new(&ctx, &[ext("pkg.b", &["b.cpp", "a.c"])]).unwrap();
        let mut exec = BuildExecutor::new(tmp.path(), RecordingRunner::new(tmp.path()).fail_on("cxx-test"));
        let err = exec.execute(&plan).unwrap_err();

        match &err {
            BuildError::Compile { command, path, code } => {
                assert!(command.starts_with("cxx-test"));
                assert_eq!(path, &PathBuf::from("b.cpp"));
                assert_eq!(*code, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("compiler error detected!"));

        let runner = exec.into_runner();
        assert_eq!(runner.commands().len(), 1);
        assert!(runner.links().is_empty());
        assert!(!tmp.path().join("out/pkg/b.so").exists());
    }

    #[test]
    fn test_link_failure_is_typed() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["k.f90"]);

        let ctx = test_context(tmp.path());
        let plan = BuildPlan::new(&ctx, &[ext("num.k", &["k.f90"])]).unwrap();
        let runner = RecordingRunner::new(tmp.path()).fail_on_link("fc-test");
        let err = BuildExecutor::new(tmp.path(), runner)
            .execute(&plan)
            .unwrap_err();
        assert!(matches!(err, BuildError::Link { .. }));
    }

    #[test]
    fn test_cython_source_is_transpiled_then_compiled() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["fast.pyx"]);

        let (report, runner) = run(tmp.path(), &[ext("pkg.fast", &["fast.pyx"])]);
        assert_eq!(report.transpiled, vec![PathBuf::from("fast.pyx")]);
        assert_eq!(report.compiled, vec![PathBuf::from("fast.c")]);
        assert_eq!(runner.programs(), vec!["cython", "cc-test", "cc-test"]);
    }

    #[test]
    fn test_transpile_failure_stops_before_compiling() {
        let tmp = TempDir::new().unwrap();
        write_sources(tmp.path(), &["fast.pyx", "util.c"]);

        let ctx = test_context(tmp.path());
        let plan = BuildPlan::new(&ctx, &[ext("pkg.fast", &["fast.pyx", "util.c"])]).unwrap();
        let mut exec =
            BuildExecutor::new(tmp.path(), RecordingRunner::new(tmp.path()).fail_on("cython"));
        let err = exec.execute(&plan).unwrap_err();

        match &err {
            BuildError::Transpile { path, code, .. } => {
                assert_eq!(path, &PathBuf::from("fast.pyx"));
                assert_eq!(*code, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let runner = exec.into_runner();
        assert_eq!(runner.programs(), vec!["cython"]);
        assert_eq!(runner.compiles_of("util.c"), 0);
        assert!(!tmp.path().join("out/pkg/fast.so").exists());
    }
}
