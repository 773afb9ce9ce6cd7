//! `cbuild build` command

use anyhow::Result;

use super::load_project;
use crate::cli::BuildArgs;
use cbuild::ops::{build_manifest, host_for, plan_manifest, BuildOptions};

pub fn execute(args: BuildArgs) -> Result<()> {
    let (manifest, config) = load_project()?;
    let plan_only = args.plan;
    let opts = BuildOptions::from(args);

    if plan_only {
        let host = host_for(&config);
        let plan = plan_manifest(&manifest, &config, &opts, &host)?;
        println!("{}", plan.to_json()?);
        return Ok(());
    }

    let report = build_manifest(&manifest, &config, &opts)?;

    if report.is_noop() {
        eprintln!("    Finished nothing to do");
    } else {
        for target in &report.linked {
            eprintln!("    Finished {}", target.display());
        }
    }

    Ok(())
}
