use super::read_inputs;
use crate::config::Config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use wml_printer::Printer;
use wml_schema::identifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The standard form as JSON
    Json,
    /// The canonical WML text
    Text,
}

#[derive(Debug, Args)]
pub struct StandardizeArgs {
    /// Input trees as JSON, most inherited first
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Annotate conditions and computed values with the identifiers they read
    #[arg(long)]
    pub dependencies: bool,

    /// Line width for text output (overrides config)
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Indentation for text output (overrides config)
    #[arg(long)]
    pub indent: Option<String>,
}

pub fn standardize(args: StandardizeArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let inputs = read_inputs(&args.inputs, config.assign_ids)?;

    eprintln!(
        "{} {} input(s)",
        "Standardizing".bright_blue().bold(),
        inputs.len()
    );

    let mut form = wml_standardize::standardize(inputs)?;
    if args.dependencies {
        form = form.assign_dependencies(identifiers)?;
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&form)?),
        OutputFormat::Text => {
            let printer = Printer::new(config.print_options(args.width, args.indent.as_deref()));
            print!("{}", printer.print_form(&form)?);
        }
    }

    eprintln!(
        "{} {} component(s) in '{}'",
        "✓".green(),
        form.keys().len(),
        form.key
    );
    Ok(())
}
