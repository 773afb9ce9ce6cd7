//! Test utilities for cbuild unit tests.
//!
//! [`RecordingRunner`] stands in for real compilers: it records every
//! command, creates the file named by `-o` and fails on request.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut exec = BuildExecutor::new(root, RecordingRunner::new(root).fail_on("cxx-test"));
//! let err = exec.execute(&plan).unwrap_err();
//! assert!(exec.into_runner().links().is_empty());
//! ```

pub mod fixtures;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::builder::errors::Result;
use crate::builder::executor::{CommandRunner, CommandStatus};
use crate::builder::toolchain::CommandSpec;

pub use fixtures::*;

/// Records commands and fakes their outputs.
#[derive(Debug, Clone)]
pub struct RecordingRunner {
    root: PathBuf,
    calls: Vec<CommandSpec>,
    fail_program: Option<String>,
    fail_link_program: Option<String>,
}

impl RecordingRunner {
    /// Create a runner resolving `-o` outputs against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RecordingRunner {
            root: root.into(),
            calls: Vec::new(),
            fail_program: None,
            fail_link_program: None,
        }
    }

    /// Exit with status 1 for every command run by `program`.
    pub fn fail_on(mut self, program: impl Into<String>) -> Self {
        self.fail_program = Some(program.into());
        self
    }

    /// Exit with status 1 only for link commands run by `program`.
    pub fn fail_on_link(mut self, program: impl Into<String>) -> Self {
        self.fail_link_program = Some(program.into());
        self
    }

    /// Every command run, in order.
    pub fn commands(&self) -> &[CommandSpec] {
        &self.calls
    }

    /// Program names, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .iter()
            .map(|c| c.program.display().to_string())
            .collect()
    }

    /// Link commands, in order.
    pub fn links(&self) -> Vec<&CommandSpec> {
        self.calls
            .iter()
            .filter(|c| is_link(c) && c.program != Path::new("cython"))
            .collect()
    }

    /// How many compile commands named `source`.
    pub fn compiles_of(&self, source: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| !is_link(c) && c.args.last().map(String::as_str) == Some(source))
            .count()
    }
}

fn is_link(command: &CommandSpec) -> bool {
    !command.args.iter().any(|a| a == "-c")
}

fn output_arg(command: &CommandSpec) -> Option<&str> {
    command
        .args
        .iter()
        .position(|a| a == "-o")
        .and_then(|i| command.args.get(i + 1))
        .map(String::as_str)
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, command: &CommandSpec, _cwd: &Path) -> Result<CommandStatus> {
        self.calls.push(command.clone());
        let program = command.program.display().to_string();

        let fails = self.fail_program.as_deref() == Some(program.as_str())
            || (is_link(command) && self.fail_link_program.as_deref() == Some(program.as_str()));
        if fails {
            return Ok(CommandStatus { code: Some(1) });
        }

        if let Some(output) = output_arg(command) {
            let path = self.root.join(output);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create output dir");
            }
            fs::write(&path, command.display()).expect("write fake output");
        }
        Ok(CommandStatus { code: Some(0) })
    }
}

/// Move a file's modification time `secs` seconds into the past.
pub fn age_file(path: &Path, secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .expect("open file to age")
        .set_modified(SystemTime::now() - Duration::from_secs(secs))
        .expect("set mtime");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_recording_runner_touches_outputs() {
        let tmp = TempDir::new().unwrap();
        let mut runner = RecordingRunner::new(tmp.path());
        let cmd = CommandSpec::new("cc").args(["-o", "t/a.o", "-c", "a.c"]);

        let status = runner.run(&cmd, tmp.path()).unwrap();
        assert!(status.success());
        assert!(tmp.path().join("t/a.o").exists());
        assert_eq!(runner.compiles_of("a.c"), 1);
        assert!(runner.links().is_empty());
    }

    #[test]
    fn test_recording_runner_failures() {
        let tmp = TempDir::new().unwrap();
        let mut runner = RecordingRunner::new(tmp.path()).fail_on_link("cc");
        let compile = CommandSpec::new("cc").args(["-o", "a.o", "-c", "a.c"]);
        let link = CommandSpec::new("cc").args(["a.o", "-o", "a.so"]);

        assert!(runner.run(&compile, tmp.path()).unwrap().success());
        assert_eq!(runner.run(&link, tmp.path()).unwrap().code, Some(1));
        assert!(!tmp.path().join("a.so").exists());
    }
}
