mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, print, records, standardize, CheckArgs, PrintArgs, RecordsArgs, StandardizeArgs};
use tracing_subscriber::EnvFilter;

/// WML CLI - canonical forms and printing for WML documents
#[derive(Parser, Debug)]
#[command(name = "wml")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge input trees into one standard form
    Standardize(StandardizeArgs),

    /// Print a tree as canonical WML text
    Print(PrintArgs),

    /// Emit the flat component records of the standard form
    Records(RecordsArgs),

    /// Validate trees against the schema
    Check(CheckArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Standardize(args) => standardize(args, &cwd),
            Command::Print(args) => print(args, &cwd),
            Command::Records(args) => records(args, &cwd),
            Command::Check(args) => check(args),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
