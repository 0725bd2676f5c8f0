use clap::{ArgAction, Parser};
use sandbox::CaseSensitivity;
use std::path::PathBuf;

/// Serves sandboxed file operations over MCP on stdio
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directories the server may touch. The first one also hosts `.trash`
    pub directories: Vec<PathBuf>,

    /// JSON configuration file (defaults to ~/.config/sandboxed-fs/config.json if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Compare paths case-sensitively
    #[arg(long, conflicts_with = "case_insensitive")]
    pub case_sensitive: bool,

    /// Compare paths case-insensitively
    #[arg(long)]
    pub case_insensitive: bool,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn parse() -> Self {
        <Args as Parser>::parse()
    }

    /// Case policy requested on the command line, if any.
    pub fn case_sensitivity(&self) -> Option<CaseSensitivity> {
        if self.case_sensitive {
            Some(CaseSensitivity::Sensitive)
        } else if self.case_insensitive {
            Some(CaseSensitivity::Insensitive)
        } else {
            None
        }
    }
}
