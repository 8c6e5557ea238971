use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wml_printer::PrintOptions;

pub const DEFAULT_CONFIG_NAME: &str = "wml.config.json";

/// WML configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Printer layout
    #[serde(default)]
    pub print: PrintOptions,

    /// Give fields, list items and entities without an id a fresh one,
    /// derived from the input path, before standardizing
    #[serde(default)]
    pub assign_ids: bool,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Printer options with command-line overrides applied
    pub fn print_options(&self, width: Option<usize>, indent: Option<&str>) -> PrintOptions {
        let mut options = self.print.clone();
        if let Some(width) = width {
            options.width = width;
        }
        if let Some(indent) = indent {
            options.indent = indent.to_string();
        }
        options
    }
}
