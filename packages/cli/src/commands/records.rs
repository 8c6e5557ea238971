use super::read_inputs;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct RecordsArgs {
    /// Input trees as JSON, most inherited first
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

/// Standardize the inputs and emit one JSON record per component
pub fn records(args: RecordsArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let inputs = read_inputs(&args.inputs, config.assign_ids)?;
    let form = wml_standardize::standardize(inputs)?;
    let records = form.records();

    println!("{}", serde_json::to_string_pretty(&records)?);
    eprintln!("{} {} record(s)", "✓".green(), records.len());
    Ok(())
}
