//! Chat CLI - exercises the sync core against the in-memory backend
//!
//! Usage: chat <command> [options]

use anyhow::anyhow;
use chat_common::{EXIT_CONFIG_ERROR, EXIT_ERROR};
use chat_config::Config;
use chat_sync::conversation::Feedback;
use chat_sync::{
    AccountService, MemoryAuth, MemoryStore, MessageList, PathResolver, SessionEvent,
    SessionHandle, SyncConfig, SyncSession, UserDirectory,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Password used for the accounts the demo creates
const DEMO_PASSWORD: &str = "demo-password";

/// Last line of the scripted conversation; the demo stops once it arrives
const CLOSING_LINE: &str = "how are you?";

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(
    name = "chat",
    version,
    about = "Realtime chat sync client"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Workspace root holding .chat/config.toml (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical path of a conversation
    Path {
        /// Local user identifier
        #[arg(long)]
        user: String,

        /// Peer identifier; omit for the general room
        #[arg(long)]
        peer: Option<String>,
    },

    /// Run a scripted two-user conversation on the in-memory backend
    Demo {
        #[arg(long, default_value = "alice")]
        user: String,

        #[arg(long, default_value = "bob")]
        peer: String,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let config = match Config::load(&root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    chat_common::telemetry::init_tracing(
        cli.verbose || config.logging.verbose,
        config.logging.json,
    );
    tracing::debug!(root = %root.display(), "chat CLI started");

    let result = match cli.command {
        Commands::Path { user, peer } => cmd_path(&config, &user, peer.as_deref()),
        Commands::Demo { user, peer, json } => cmd_demo(&config, &user, &peer, json).await,
        Commands::Config => cmd_config(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_ERROR);
    }
}

//
// Command implementations
//

fn cmd_path(config: &Config, user: &str, peer: Option<&str>) -> anyhow::Result<()> {
    let resolver = PathResolver::try_new(SyncConfig::from(config))?;
    match resolver.resolve(user, peer) {
        Some(path) => {
            println!("{}", path);
            Ok(())
        }
        None => anyhow::bail!(
            "no conversation path for user {:?} and peer {:?}",
            user,
            peer
        ),
    }
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

async fn cmd_demo(config: &Config, user: &str, peer: &str, json: bool) -> anyhow::Result<()> {
    if user.is_empty() || peer.is_empty() || user == peer {
        anyhow::bail!("demo needs two distinct, non-empty identifiers");
    }

    let sync_config = SyncConfig::from(config);
    let resolver = PathResolver::try_new(sync_config.clone())?;
    let store = Arc::new(MemoryStore::new());
    tracing::info!(base_url = %config.backend.base_url, "using the in-memory backend");
    if !json {
        eprintln!("✓ In-memory stand-in for {}", config.backend.base_url);
    }
    let accounts = AccountService::new(MemoryAuth::new(), Arc::clone(&store), resolver.clone());

    // The peer signs up and leaves a message before the local user arrives
    accounts.sign_up(peer, DEMO_PASSWORD)?;
    let (peer_handle, peer_task, _peer_events) =
        SessionHandle::spawn(SyncSession::new(Arc::clone(&store), sync_config.clone()));
    peer_handle.set_current_user(peer).await?;
    peer_handle.set_current_peer(Some(user)).await?;
    peer_handle.send_message("hi").await?;
    accounts.logout();

    let info = match accounts.resume() {
        Some(info) => info,
        None => accounts.sign_up(user, DEMO_PASSWORD)?,
    };

    let (handle, task, mut events) =
        SessionHandle::spawn(SyncSession::new(Arc::clone(&store), sync_config));
    handle.watch_users().await?;
    handle.set_current_user(info.email.as_str()).await?;
    handle.set_current_peer(Some(peer)).await?;
    handle.send_message("hello").await?;
    peer_handle.send_message(CLOSING_LINE).await?;

    let general = resolver.resolve(&info.email, None);
    let mut messages = MessageList::new();
    messages.set_local_user(Some(info.email.as_str()));
    let mut users = UserDirectory::new();

    loop {
        let event = tokio::time::timeout(EVENT_TIMEOUT, events.recv())
            .await
            .map_err(|_| anyhow!("timed out waiting for session events"))?
            .ok_or_else(|| anyhow!("session ended before the conversation finished"))?;

        if let SessionEvent::ConversationChanged { path } = &event {
            messages.set_general_room(path.is_some() && *path == general);
        }
        let feedback = messages.apply(&event);
        users.apply(&event);
        print_event(&event, feedback, json)?;

        if matches!(&event, SessionEvent::Message(m) if !m.is_echo && m.text == CLOSING_LINE) {
            break;
        }
    }

    handle.shutdown().await?;
    task.join().await?;
    peer_handle.shutdown().await?;
    peer_task.join().await?;
    accounts.logout();

    if !json {
        eprintln!(
            "✓ {} messages, {} users",
            messages.len(),
            users.identifiers().len()
        );
    }
    Ok(())
}

fn print_event(event: &SessionEvent, feedback: Option<Feedback>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match (event, feedback) {
        (SessionEvent::ConversationChanged { path: Some(path) }, _) => {
            println!("conversation {}", path)
        }
        (SessionEvent::ConversationChanged { path: None }, _) => println!("conversation none"),
        (SessionEvent::Message(message), Some(Feedback::Sent)) => {
            println!("[sent] {}: {}", message.sender_identifier, message.text)
        }
        (SessionEvent::Message(message), _) => {
            println!("[received] {}: {}", message.sender_identifier, message.text)
        }
        (SessionEvent::UserAdded { identifier }, _) => println!("user {}", identifier),
    }
    Ok(())
}
