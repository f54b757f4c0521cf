//! inboxview - browse an exported chat archive from the terminal
//!
//! Points the core at a granted archive folder and prints conversation
//! listings, conversation transcripts, statistics and attachments.

mod message_format;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inboxview_core::{
    group, search, ArchiveLayout, ArchiveLocator, AttachmentResolver, Config, ConversationLoader,
    ConversationStatistics, HandlePool, LocalDirectory,
};
use message_format::{body_line, burst_header, format_timestamp, reaction_badges};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inboxview")]
#[command(about = "Browse an exported chat archive")]
#[command(version)]
struct Args {
    /// Folder holding the export (the inbox itself or any folder above it)
    #[arg(short, long)]
    archive: PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List conversations, most recent first
    List {
        /// Only show conversations whose title or folder contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Print a conversation grouped by sender
    Show {
        /// Conversation folder name (as shown by `list`)
        dir_name: String,
    },

    /// Show message statistics for a conversation
    Stats {
        /// Conversation folder name (as shown by `list`)
        dir_name: String,
    },

    /// List and resolve every attachment of a conversation
    Attachments {
        /// Conversation folder name (as shown by `list`)
        dir_name: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        inboxview_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let granted = LocalDirectory::open(args.archive.clone())
        .with_context(|| format!("cannot open {}", args.archive.display()))?
        .into_handle();

    let layout = ArchiveLocator::new(&config.archive)
        .locate(&granted)
        .context("failed to read archive")?
        .with_context(|| {
            format!(
                "{} is not a valid archive: no '{}' folder found",
                args.archive.display(),
                config.archive.conversations_label
            )
        })?;

    let loader = ConversationLoader::new(&config.archive);

    match args.command {
        Command::List { search: query } => {
            run_list(&loader, &layout, query.as_deref().unwrap_or(""), args.json)
        }
        Command::Show { dir_name } => run_show(&config, &loader, &layout, &granted, &dir_name),
        Command::Stats { dir_name } => run_stats(&loader, &layout, &dir_name, args.json),
        Command::Attachments { dir_name } => {
            run_attachments(&config, &loader, &layout, &dir_name, args.json)
        }
    }
}

fn run_list(
    loader: &ConversationLoader,
    layout: &ArchiveLayout,
    query: &str,
    json: bool,
) -> Result<()> {
    let index = loader
        .list_summaries(&layout.conversations_root)
        .context("failed to list conversations")?;

    for skipped in &index.skipped {
        eprintln!("warning: skipped {}: {}", skipped.dir_name, skipped.reason);
    }

    let found = search(&index.summaries, query);

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("No conversations found.");
        return Ok(());
    }

    for summary in &found {
        println!(
            "{:<16}  {:<30}  {}",
            format_timestamp(summary.last_sent),
            summary.title,
            summary.dir_name
        );
    }
    println!("\n{} conversation(s)", found.len());
    Ok(())
}

fn run_show(
    config: &Config,
    loader: &ConversationLoader,
    layout: &ArchiveLayout,
    granted: &inboxview_core::DirHandle,
    dir_name: &str,
) -> Result<()> {
    let conversation = loader
        .load_full(&layout.conversations_root, dir_name)
        .with_context(|| format!("failed to load conversation {dir_name}"))?;

    let owner = owner_or_unknown(ArchiveLocator::new(&config.archive).owner_name(granted))
        .context("failed to read owner profile")?;

    let participants: Vec<&str> = conversation
        .participants
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    println!("{}", conversation.title);
    println!("Participants: {}", participants.join(", "));

    for burst in group(&conversation.messages) {
        println!();
        println!("{}", burst_header(&burst, owner.as_deref()));
        for msg in burst.messages() {
            println!("  {}", body_line(msg));
            if let Some(badges) = reaction_badges(msg) {
                println!("    {badges}");
            }
        }
    }
    Ok(())
}

/// A missing or unreadable profile only means own messages are not
/// marked; fatal errors still end the session.
fn owner_or_unknown(
    owner: inboxview_core::Result<Option<String>>,
) -> inboxview_core::Result<Option<String>> {
    match owner {
        Ok(owner) => Ok(owner),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read owner profile");
            Ok(None)
        }
    }
}

fn run_stats(
    loader: &ConversationLoader,
    layout: &ArchiveLayout,
    dir_name: &str,
    json: bool,
) -> Result<()> {
    let conversation = loader
        .load_full(&layout.conversations_root, dir_name)
        .with_context(|| format!("failed to load conversation {dir_name}"))?;
    let stats = ConversationStatistics::compute(&conversation);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", conversation.title);
    println!("  Messages:     {}", stats.total_count);
    println!("  Participants: {}", stats.participant_count);
    match stats.created_at {
        Some(first) => {
            println!("  First:        {}", format_timestamp(first));
            println!("  Last:         {}", format_timestamp(stats.last_sent));
        }
        None => println!("  No messages"),
    }

    let ranked = stats.ranked();
    if !ranked.is_empty() {
        println!("\nBy sender:");
        for share in ranked {
            println!(
                "  {:<30} {:>6}  {:>5.1}%",
                share.name, share.count, share.percent
            );
        }
    }
    Ok(())
}

fn run_attachments(
    config: &Config,
    loader: &ConversationLoader,
    layout: &ArchiveLayout,
    dir_name: &str,
    json: bool,
) -> Result<()> {
    let conversation = loader
        .load_full(&layout.conversations_root, dir_name)
        .with_context(|| format!("failed to load conversation {dir_name}"))?;

    let mut pool = HandlePool::new(
        AttachmentResolver::for_layout(layout),
        config.attachments.pool_capacity,
    );

    let mut rows = Vec::new();
    for msg in &conversation.messages {
        for attachment in msg.attachments() {
            let handle = pool
                .get_or_resolve(layout.attachments_root.as_ref(), attachment)
                .with_context(|| format!("failed to read attachment {}", attachment.uri))?;

            rows.push(match handle {
                Some(handle) => serde_json::json!({
                    "uri": attachment.uri,
                    "path": handle.path(),
                    "mime": handle.mime(),
                    "size": handle.len(),
                    "found": true,
                }),
                None => serde_json::json!({
                    "uri": attachment.uri,
                    "found": false,
                }),
            });
        }
    }
    pool.clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No attachments.");
        return Ok(());
    }

    for row in &rows {
        let uri = row["uri"].as_str().unwrap_or_default();
        if row["found"].as_bool().unwrap_or(false) {
            println!(
                "{}  {}  {} bytes",
                uri,
                row["mime"].as_str().unwrap_or_default(),
                row["size"]
            );
        } else {
            println!("{uri}  (missing)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inboxview_core::Error;

    #[test]
    fn test_owner_or_unknown_propagates_fatal_errors() {
        let revoked = owner_or_unknown(Err(Error::CapabilityRevoked("export".to_string())));
        assert!(matches!(revoked, Err(Error::CapabilityRevoked(_))));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert!(matches!(owner_or_unknown(Err(Error::Io(io))), Err(Error::Io(_))));
    }

    #[test]
    fn test_owner_or_unknown_absorbs_benign_errors() {
        let malformed = Error::MalformedArchive {
            dir: "profile_information".to_string(),
            message: "bad json".to_string(),
        };
        assert!(matches!(owner_or_unknown(Err(malformed)), Ok(None)));
        assert_eq!(
            owner_or_unknown(Ok(Some("Zoë".to_string()))).unwrap().as_deref(),
            Some("Zoë")
        );
    }
}
