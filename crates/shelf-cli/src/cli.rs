//! CLI argument definitions for the Shelf catalog shell.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use shelf_model::{CreatorColumn, WorkColumn};

#[derive(Parser)]
#[command(
    name = "shelf",
    version,
    about = "Shelf - Track works, creators and reading progress",
    long_about = "Track works, the creators behind them and your progress through each.\n\n\
                  Every command works on one SQLite library file. The last opened\n\
                  library is remembered, so --database is only needed to switch."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Library database to use (default: the last opened one).
    #[arg(long = "database", short = 'd', value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open (or create) a library and make it the default.
    Open {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// List recently opened libraries.
    Recent,

    /// List works, filtered and sorted.
    Works(WorksArgs),

    /// List works whose status is flagged for updates.
    Updates(FilterArgs),

    /// List creators.
    Creators(CreatorsArgs),

    /// Show one work with its creators.
    ShowWork { work: String },

    /// Show one creator with their works.
    ShowCreator { creator: String },

    /// Add a work.
    AddWork(AddWorkArgs),

    /// Add a creator.
    AddCreator {
        name: String,

        /// Works to relate the new creator to (id or name, repeatable).
        #[arg(long = "work", value_name = "WORK")]
        works: Vec<String>,
    },

    /// Rename a work.
    RenameWork { work: String, name: String },

    /// Set a work's progress, e.g. the last chapter read.
    Progress { work: String, progress: String },

    /// Change a work's status.
    SetStatus { work: String, status: String },

    /// Change a work's type.
    SetType { work: String, work_type: String },

    /// Change a work's format.
    SetFormat { work: String, format: String },

    /// Rename a creator.
    RenameCreator { creator: String, name: String },

    /// Remove a work and its creator links.
    RemoveWork { work: String },

    /// Remove a creator and their work links.
    RemoveCreator { creator: String },

    /// Relate a creator to a work.
    Attach { work: String, creator: String },

    /// Remove the relation between a creator and a work.
    Detach { work: String, creator: String },

    /// Manage statuses.
    #[command(subcommand)]
    Status(StatusCommand),

    /// Manage work types.
    #[command(subcommand)]
    Type(TaxonomyCommand),

    /// Manage formats.
    #[command(subcommand)]
    Format(TaxonomyCommand),
}

#[derive(Args, Default)]
pub struct FilterArgs {
    /// Keep works whose name contains this text (case-insensitive).
    #[arg(long = "name", value_name = "TEXT")]
    pub name: Option<String>,

    /// Keep works with this status (id or name, repeatable).
    #[arg(long = "status", value_name = "STATUS")]
    pub statuses: Vec<String>,

    /// Keep works with this type (id or name, repeatable).
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<String>,

    /// Keep works with this format (id or name, repeatable).
    #[arg(long = "format", value_name = "FORMAT")]
    pub formats: Vec<String>,
}

#[derive(Args)]
pub struct WorksArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Column to sort by. Remembered for later listings.
    #[arg(long = "sort", value_enum)]
    pub sort: Option<WorkSortArg>,

    /// Reverse the sort direction.
    #[arg(long = "desc")]
    pub descending: bool,
}

#[derive(Args)]
pub struct CreatorsArgs {
    /// Keep creators whose name contains this text (case-insensitive).
    #[arg(long = "name", value_name = "TEXT")]
    pub name: Option<String>,

    /// Column to sort by. Remembered for later listings.
    #[arg(long = "sort", value_enum)]
    pub sort: Option<CreatorSortArg>,

    /// Reverse the sort direction.
    #[arg(long = "desc")]
    pub descending: bool,
}

#[derive(Args)]
pub struct AddWorkArgs {
    pub name: String,

    /// Initial progress.
    #[arg(long = "progress", default_value = "0")]
    pub progress: String,

    /// Status (id or name, default: first in display order).
    #[arg(long = "status")]
    pub status: Option<String>,

    /// Type (id or name, default: first in display order).
    #[arg(long = "type")]
    pub work_type: Option<String>,

    /// Format (id or name, default: first in display order).
    #[arg(long = "format")]
    pub format: Option<String>,

    /// Creators to relate the new work to (id or name, repeatable).
    #[arg(long = "creator", value_name = "CREATOR")]
    pub creators: Vec<String>,
}

/// Operations shared by statuses, types and formats.
#[derive(Subcommand)]
pub enum TaxonomyCommand {
    /// List entries in display order.
    List,

    /// Add an entry at the end of the display order.
    Add { name: String },

    /// Remove an entry. Fails while any work still uses it.
    Remove { entry: String },

    /// Rename an entry.
    Rename { entry: String, name: String },

    /// Move an entry to the position currently held by TARGET.
    Reorder { entry: String, target: String },
}

#[derive(Subcommand)]
pub enum StatusCommand {
    #[command(flatten)]
    Common(TaxonomyCommand),

    /// Route works with this status into the update list (or stop with --off).
    Flag {
        entry: String,

        #[arg(long = "off")]
        off: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WorkSortArg {
    Name,
    Progress,
    Status,
    Type,
    Format,
    Updated,
    Added,
}

impl From<WorkSortArg> for WorkColumn {
    fn from(arg: WorkSortArg) -> Self {
        match arg {
            WorkSortArg::Name => Self::Name,
            WorkSortArg::Progress => Self::Progress,
            WorkSortArg::Status => Self::Status,
            WorkSortArg::Type => Self::Type,
            WorkSortArg::Format => Self::Format,
            WorkSortArg::Updated => Self::Updated,
            WorkSortArg::Added => Self::Added,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CreatorSortArg {
    Name,
    Works,
}

impl From<CreatorSortArg> for CreatorColumn {
    fn from(arg: CreatorSortArg) -> Self {
        match arg {
            CreatorSortArg::Name => Self::Name,
            CreatorSortArg::Works => Self::Works,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
