use anyhow::{Context, Result};
use std::path::PathBuf;

use super::args::{HistoryCliArgs, HistoryCommand};
use crate::error::MinutesError;
use crate::export::{write_export, ExportMetadata};
use crate::global;
use crate::store::SessionStore;

pub async fn handle_history_command(args: HistoryCliArgs, sessions: &SessionStore) -> Result<()> {
    match args.command.unwrap_or(HistoryCommand::List { limit: 20 }) {
        HistoryCommand::List { limit } => list_sessions(sessions, limit).await,
        HistoryCommand::Show { id } => show_session(sessions, &id).await,
        HistoryCommand::Delete { id } => delete_session(sessions, &id).await,
        HistoryCommand::Export { id, out } => export_session(sessions, &id, out).await,
    }
}

async fn list_sessions(sessions: &SessionStore, limit: usize) -> Result<()> {
    let records = sessions.load().await?;
    if records.is_empty() {
        println!("No saved sessions yet.");
        return Ok(());
    }

    println!("Found {} session(s):\n", records.len());
    for record in records.iter().take(limit) {
        let speakers = record.speaker_log.len();
        println!("ID: {}", record.id);
        println!("Name: {}", record.name);
        println!(
            "{} {} | {} | {} speaker change{} | {}",
            record.date,
            record.time,
            record.duration,
            speakers,
            if speakers == 1 { "" } else { "s" },
            if record.has_audio { "audio" } else { "no audio" }
        );
        println!("---");
    }

    println!("\nTo see a session's speaker log, use: seatlog history show <ID>");
    Ok(())
}

async fn show_session(sessions: &SessionStore, id: &str) -> Result<()> {
    let record = sessions.get(id).await?;

    println!("{} ({} {})", record.name, record.date, record.time);
    println!("Duration: {}", record.duration);
    println!("Audio: {}", if record.has_audio { "yes" } else { "no" });
    println!();

    let timeline = record.timeline();
    if timeline.is_empty() {
        println!("No speaker log for this session.");
    }
    for entry in timeline.entries() {
        if entry.alias.is_empty() {
            println!("{}  {}", entry.clock(), entry.speaker);
        } else {
            println!("{}  {} ({})", entry.clock(), entry.speaker, entry.alias);
        }
    }
    Ok(())
}

async fn delete_session(sessions: &SessionStore, id: &str) -> Result<()> {
    let report = sessions.delete(id).await?;
    if !report.metadata_removed {
        println!("Session {} not found.", id);
    } else {
        println!("Deleted session {}", id);
    }

    match report.audio {
        Ok(true) => println!("Removed stored audio."),
        Ok(false) => {}
        Err(e) => eprintln!("Warning: audio for {} could not be removed: {}", id, e),
    }
    Ok(())
}

async fn export_session(sessions: &SessionStore, id: &str, out: Option<PathBuf>) -> Result<()> {
    let record = sessions.get(id).await?;
    let dir = match out {
        Some(dir) => dir,
        None => global::exports_dir()?,
    };

    let audio = match sessions.fetch_audio(id).await {
        Ok(payload) => Some(payload),
        Err(MinutesError::NotFound(msg)) => {
            println!("{}", msg);
            None
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = ExportMetadata::from_record(&record);
    let files = write_export(&dir, &metadata, audio.as_ref())
        .with_context(|| format!("Failed to export session to {}", dir.display()))?;

    println!("Minutes: {}", files.metadata.display());
    if let Some(path) = files.audio {
        println!("Audio: {}", path.display());
    }
    Ok(())
}
