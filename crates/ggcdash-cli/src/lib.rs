//! Shared CLI definitions for ggcdash.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments for ggcdash
#[derive(Clone, Parser, Debug, Default)]
#[command(
    name = "ggcdash",
    version,
    about = "GGC Laptop Profit Sheet Data Analysis",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to the workbook (xlsx, xlsm, xlsb, xls, ods). Overrides [workbook] path from the config file
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Sheet to show first (e.g. "Return"). Defaults to the first configured sheet found in the workbook
    #[arg(long = "sheet", value_name = "SHEET")]
    pub sheet: Option<String>,

    /// Directory where exported CSV and PNG files are written (default: current directory)
    #[arg(long = "export-dir", value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Enable debug mode: show the debug overlay and log at debug level
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write the log to this file instead of the default file in the cache directory
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Clear all cache data (including the log file) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/ggcdash/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
