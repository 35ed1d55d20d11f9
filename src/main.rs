use anyhow::Result;
use clap::Parser;
use seatlog::{
    cli::{handle_history_command, Cli, CliCommand},
    config::Config,
    store::{SessionStore, SqliteStore},
};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_filter = EnvFilter::try_new(cli.log_level()).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) | None => {
            println!("seatlog {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(CliCommand::History(args)) => {
            let config = Config::load()?;
            let db_path = match cli.database {
                Some(path) => path,
                None => config.storage.resolve_database_path()?,
            };
            debug!("Using session database {}", db_path.display());

            let backend = Arc::new(SqliteStore::new(db_path));
            let sessions = SessionStore::with_backend(backend, config.storage.history_key.clone());
            handle_history_command(args, &sessions).await
        }
    }
}
