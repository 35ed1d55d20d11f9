use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seatlog")]
#[command(about = "Seating chart and speaker log history for recorded meetings", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this database instead of the configured one
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl Cli {
    /// Default tracing filter directive.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// List, inspect, export or delete saved sessions
    History(HistoryCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct HistoryCliArgs {
    #[command(subcommand)]
    pub command: Option<HistoryCommand>,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List saved sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show a session with its speaker log
    Show { id: String },
    /// Delete a session and its audio
    Delete { id: String },
    /// Write the session's minutes and audio into a directory
    Export {
        id: String,
        /// Output directory (defaults to the exports folder in the data directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}
