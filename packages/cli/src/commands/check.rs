use super::read_tree;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use wml_schema::{validate_tree, StatementTag, Tag, Visitor};
use wml_tagtree::NodeExtra;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Trees to validate, as JSON
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

/// Entity and branch counts for the summary line
#[derive(Debug, Default)]
struct Census {
    entities: usize,
    conditions: usize,
}

impl Visitor for Census {
    fn visit_entity(&mut self, _tag: &Tag, _key: &str, _extra: &NodeExtra) {
        self.entities += 1;
    }

    fn visit_statement(&mut self, _statement: &StatementTag) {
        self.conditions += 1;
    }
}

/// Validate every input against the per-kind allow-lists
pub fn check(args: CheckArgs) -> Result<()> {
    let mut failed = 0usize;

    for path in &args.inputs {
        let result = read_tree(path).and_then(|tree| {
            validate_tree(&tree)?;
            let mut census = Census::default();
            census.visit_tree(&tree);
            Ok(census)
        });
        match result {
            Ok(census) => println!(
                "  {} {} ({} entities, {} conditions)",
                "✓".green(),
                path.display(),
                census.entities,
                census.conditions
            ),
            Err(err) => {
                failed += 1;
                eprintln!("  {} {} - {}", "✗".red(), path.display(), err.to_string().red());
            }
        }
    }

    println!();
    if failed > 0 {
        return Err(anyhow!(
            "{failed} of {} file(s) failed validation",
            args.inputs.len()
        ));
    }
    println!("{} {} file(s) valid", "✅".green(), args.inputs.len());
    Ok(())
}
