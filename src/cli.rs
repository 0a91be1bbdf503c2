use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interactive video authoring tool: inspect and edit interaction documents
#[derive(Parser, Debug)]
#[command(name = "iveditor", author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable logging to file (default: iveditor.log in the data directory)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report invalid windows, off-canvas elements and start-time conflicts
    Check {
        /// Document JSON
        file: PathBuf,

        /// Video length in seconds (enables time window range checks)
        #[arg(short = 'd', long = "duration", value_name = "SECONDS")]
        duration: Option<f64>,
    },

    /// Add, remove or rename bookmarks
    Bookmark {
        #[command(subcommand)]
        action: BookmarkCommand,
    },

    /// Edit interactions
    Interaction {
        #[command(subcommand)]
        action: InteractionCommand,
    },

    /// List the element types a library catalog offers
    Catalog {
        /// Catalog JSON (array of {name, uberName, title, restricted})
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookmarkCommand {
    /// Add a bookmark at a time
    Add {
        file: PathBuf,

        /// Time in seconds
        #[arg(short = 't', long = "time")]
        time: f64,

        /// Label (default from settings)
        #[arg(short = 'L', long = "label")]
        label: Option<String>,

        /// Write here instead of overwriting FILE
        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Remove the bookmark at a position
    Remove {
        file: PathBuf,

        #[arg(short = 'i', long = "index")]
        index: usize,

        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Change a bookmark's label
    Rename {
        file: PathBuf,

        #[arg(short = 'i', long = "index")]
        index: usize,

        #[arg(short = 'L', long = "label")]
        label: String,

        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum InteractionCommand {
    /// Remove the interaction at a position
    Remove {
        file: PathBuf,

        #[arg(short = 'i', long = "index")]
        index: usize,

        #[arg(short = 'o', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_bookmark_add() {
        let args = Args::parse_from(["iveditor", "-vv", "bookmark", "add", "doc.json", "--time", "12.5"]);
        assert_eq!(args.verbosity, 2);
        match args.command {
            Commands::Bookmark {
                action: BookmarkCommand::Add { time, label, out, .. },
            } => {
                assert_eq!(time, 12.5);
                assert!(label.is_none());
                assert!(out.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
