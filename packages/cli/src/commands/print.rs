use super::read_tree;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use wml_printer::{parse, Printer};

#[derive(Debug, Args)]
pub struct PrintArgs {
    /// Tree to print, as JSON
    pub input: PathBuf,

    /// Line width (overrides config)
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Indentation (overrides config)
    #[arg(long)]
    pub indent: Option<String>,

    /// Read the printed text back and fail unless it matches the input
    #[arg(long)]
    pub verify: bool,
}

pub fn print(args: PrintArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let tree = read_tree(&args.input)?;
    let printer = Printer::new(config.print_options(args.width, args.indent.as_deref()));
    let output = printer.print(&tree)?;

    if args.verify && parse(&output)? != tree {
        return Err(anyhow!(
            "Printed text of {} does not read back to the same tree",
            args.input.display()
        ));
    }

    print!("{output}");
    Ok(())
}
