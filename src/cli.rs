use std::path::PathBuf;

use clap::Parser;

/// Create a directory skeleton from a named template in `templates.json`.
#[derive(Parser, Debug)]
#[command(name = "tdg", version, about = "Create directory structure based on templates")]
pub struct Cli {
    /// Template to use for the directory structure.
    #[arg(required_unless_present = "list")]
    pub template: Option<String>,
    /// Name for the new directory; also replaces `!name!` in template paths.
    #[arg(required_unless_present = "list")]
    pub name: Option<String>,
    /// Template config to read instead of the default location.
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,
    /// Print what would be created without touching the filesystem.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
    /// List the templates in the config and exit.
    #[arg(short = 'l', long = "list", conflicts_with_all = ["template", "name"])]
    pub list: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn parse() -> Cli {
    Cli::parse()
}
