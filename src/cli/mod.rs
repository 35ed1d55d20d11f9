pub mod args;
pub mod history;

pub use args::{Cli, CliCommand, HistoryCliArgs, HistoryCommand};
pub use history::handle_history_command;
