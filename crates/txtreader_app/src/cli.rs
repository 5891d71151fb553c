use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "txtreader",
    about = "Page through large plain-text books with saved progress"
)]
pub struct Cli {
    /// Directory holding config, progress, history and sampler state
    #[arg(long, global = true, default_value = "./.txtreader")]
    pub state_dir: PathBuf,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Characters per page; overrides the stored config
    #[arg(long, global = true)]
    pub words_per_page: Option<NonZeroUsize>,

    /// Namespace for progress records, for sharing one state directory
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a book and page through it
    Read { path: PathBuf },
    /// Pick a book not drawn before from a directory
    Random {
        /// Defaults to the configured search paths
        directory: Option<PathBuf>,
        /// Start reading the pick right away
        #[arg(long, default_value_t = false)]
        open: bool,
    },
    /// Forget which books were already drawn
    Reset {
        /// Every directory when omitted
        directory: Option<PathBuf>,
    },
    /// List recently read books
    History,
    /// Remove a book from the history
    Forget { file_name: String },
    /// Merge the history of another state directory into this one
    Merge { remote_state_dir: PathBuf },
    /// Print the chapter list of an online table of contents as JSON
    Catalog { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}
