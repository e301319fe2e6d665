use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::error::CiteError;
use crate::fields::Field;
use crate::style::Style;

#[derive(Parser, Debug)]
#[command(version, about = "Create citations from website URLs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a citation for one URL
    Create {
        #[arg(value_name = "URL")]
        url: String,
        #[command(flatten)]
        opts: CreateOpts,
    },
    /// Generate citations for each URL in a newline-delimited file
    Batch {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        opts: CreateOpts,
    },
    /// Inspect the citation log
    Logs {
        #[command(subcommand)]
        command: LogsCommand,
    },
}

/// Flags shared by `create` and `batch`.
#[derive(Args, Debug)]
pub struct CreateOpts {
    /// The citation style
    #[arg(
        short = 'f',
        long = "fmt",
        value_enum,
        ignore_case = true,
        default_value_t = Style::Mla
    )]
    pub fmt: Style,

    /// Omit the accessed date from the citation
    #[arg(long)]
    pub no_date: bool,

    /// Omit the URL from the citation
    #[arg(long)]
    pub no_url: bool,

    /// Override an extracted field. May be given multiple times.
    #[arg(
        long = "override",
        num_args = 2,
        value_names = ["FIELD", "VALUE"],
        action = ArgAction::Append
    )]
    pub overrides: Vec<String>,

    /// Print the citation to stdout (default)
    #[arg(long, overrides_with = "no_dump")]
    pub dump: bool,

    /// Don't print the citation to stdout
    #[arg(long, overrides_with = "dump")]
    pub no_dump: bool,

    /// Append the citation to the local log (default)
    #[arg(long, overrides_with = "no_log")]
    pub log: bool,

    /// Don't append the citation to the local log
    #[arg(long, overrides_with = "log")]
    pub no_log: bool,

    /// Copy the citation to the clipboard (default)
    #[arg(long, overrides_with = "no_copy")]
    pub copy: bool,

    /// Don't copy the citation to the clipboard
    #[arg(long, overrides_with = "copy")]
    pub no_copy: bool,

    /// Location of the citation log database
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

impl CreateOpts {
    pub fn dump(&self) -> bool {
        !self.no_dump
    }

    pub fn log(&self) -> bool {
        !self.no_log
    }

    pub fn copy(&self) -> bool {
        !self.no_copy
    }

    /// Validate `--override` pairs up front, before any fetching happens.
    pub fn parsed_overrides(&self) -> Result<Vec<(Field, &str)>, CiteError> {
        self.overrides
            .chunks(2)
            .map(|pair| Ok((pair[0].parse()?, pair[1].as_str())))
            .collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum LogsCommand {
    /// List logged citations, most recent first
    List {
        /// Maximum number of records to show (0 means all)
        #[arg(short = 'n', long = "count", default_value_t = 0, value_name = "COUNT")]
        count: usize,

        /// Case-insensitive substring filter over citations and fields
        #[arg(short = 'q', long = "query", value_name = "QUERY")]
        query: Option<String>,

        /// Location of the citation log database
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
    },
    /// Print the location of the citation log database
    Path {
        /// Location of the citation log database
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
    },
}
