//! `cbuild toolchain` command

use anyhow::Result;

use super::load_project;
use cbuild::builder::CommandSpec;
use cbuild::ops::{host_for, toolchain_for};
use cbuild::util::process::find_executable;

fn show(label: &str, spec: &CommandSpec) {
    let found = match find_executable(&spec.program) {
        Some(path) => path.display().to_string(),
        None => "not found".to_string(),
    };
    println!("  {:<12} {}", label, spec);
    println!("  {:<12} ({})", "", found);
}

pub fn execute() -> Result<()> {
    let (_, config) = load_project()?;
    let host = host_for(&config);
    let toolchain = toolchain_for(&config, &host)?;

    println!("Toolchain ({:?}):", config.toolchain.source.unwrap_or_default());
    println!();
    show("CC:", &toolchain.cc);
    show("CXX:", &toolchain.cxx);
    show("FC:", &toolchain.fc);
    show("LDSHARED:", &toolchain.ldshared);
    match &toolchain.ldcxxshared {
        Some(spec) => show("LDCXXSHARED:", spec),
        None => println!("  {:<12} (none)", "LDCXXSHARED:"),
    }
    println!();
    println!("  arch flag:   {:?}", toolchain.arch_flag);
    println!("  object:      .{}", toolchain.object_extension);
    println!("  module:      .{}", toolchain.shared_object_extension);

    Ok(())
}
