//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use cbuild::MacroDef;

/// cbuild - incremental builds for C, C++, Fortran and Cython extension modules
#[derive(Parser)]
#[command(name = "cbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the extension modules listed in Cbuild.toml
    Build(BuildArgs),

    /// Remove build artifacts
    Clean(CleanArgs),

    /// Build into the packaging tool's output, then install it
    Install(BuildArgs),

    /// Show the resolved compiler and linker table
    Toolchain,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Clone)]
pub struct BuildArgs {
    /// Architecture tag (defaults to the host architecture)
    #[arg(long)]
    pub arch: Option<String>,

    /// Define a macro for every compile (NAME or NAME=VALUE)
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    pub define: Vec<MacroDef>,

    /// Add an include directory for every compile
    #[arg(short = 'I', value_name = "DIR")]
    pub include: Vec<PathBuf>,

    /// Add a library search directory for every link
    #[arg(short = 'L', value_name = "DIR")]
    pub lib_dir: Vec<PathBuf>,

    /// Print the build plan as JSON without running anything
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove finished extension modules
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
