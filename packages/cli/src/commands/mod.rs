pub mod check;
pub mod print;
pub mod records;
pub mod standardize;

pub use check::{check, CheckArgs};
pub use print::{print, PrintArgs};
pub use records::{records, RecordsArgs};
pub use standardize::{standardize, StandardizeArgs};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use wml_schema::{assign_missing_ids, IdGenerator, WmlTree};

/// Read a typed tree serialized as JSON
pub fn read_tree(path: &Path) -> Result<WmlTree> {
    let content = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not a JSON tree", path.display()))
}

/// Read every input in order, optionally filling in missing ids seeded
/// from each input's path
pub fn read_inputs(paths: &[PathBuf], assign_ids: bool) -> Result<Vec<WmlTree>> {
    let mut trees = Vec::with_capacity(paths.len());
    for path in paths {
        let mut tree = read_tree(path)?;
        if assign_ids {
            let mut ids = IdGenerator::new(&path.display().to_string());
            let assigned = assign_missing_ids(&mut tree, &mut ids);
            debug!(path = %path.display(), assigned, "assigned ids");
        }
        trees.push(tree);
    }
    Ok(trees)
}
