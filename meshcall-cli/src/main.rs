mod console;

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use meshcall_client::{
    ClientConfig, DEFAULT_MAX_ICE_RESTARTS, Extensions, ReconnectPolicy, RoomClient, RoomHandle,
    SyntheticMediaSource, TransportConfig, WebRtcTransportFactory,
};
use meshcall_server::{DEFAULT_BIND, ServerConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleObserver;

#[derive(Parser)]
#[command(name = "meshcall", version, about = "Mesh video calls over a room relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "MESHCALL_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,

        /// JSON list of ICE servers handed to every participant.
        #[arg(long)]
        ice_servers: Option<PathBuf>,
    },

    /// Join a room as a headless participant.
    Join {
        #[arg(long, env = "MESHCALL_SERVER", default_value = "ws://127.0.0.1:8000")]
        server: String,

        #[arg(short, long, env = "MESHCALL_ROOM")]
        room: Option<String>,

        #[arg(short, long, env = "MESHCALL_NAME")]
        name: Option<String>,

        /// Only use TURN relay candidates.
        #[arg(long)]
        relay_only: bool,

        /// Reconnect attempts before giving up; 0 retries forever.
        #[arg(long, default_value_t = 10)]
        max_reconnects: u32,

        #[arg(long, default_value_t = DEFAULT_MAX_ICE_RESTARTS)]
        max_ice_restarts: u32,

        #[arg(long)]
        no_chat: bool,

        #[arg(long)]
        no_screen_share: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { bind, ice_servers } => {
            let mut config = ServerConfig::default().with_bind(bind);
            if let Some(path) = ice_servers {
                config = config.with_ice_servers_file(&path)?;
            }
            println!("{} {}", "🚀 meshcall relay on".green().bold(), bind);
            meshcall_server::serve(config).await?;
        }

        Commands::Join {
            server,
            room,
            name,
            relay_only,
            max_reconnects,
            max_ice_restarts,
            no_chat,
            no_screen_share,
        } => {
            let room = prompt_if_missing(room, "Room", "--room")?;
            let name = prompt_if_missing(name, "Your name", "--name")?;

            let transport = if relay_only {
                TransportConfig::default().relay_only()
            } else {
                TransportConfig::default()
            };
            let reconnect = ReconnectPolicy {
                max_attempts: (max_reconnects > 0).then_some(max_reconnects),
                ..ReconnectPolicy::default()
            };
            let config = ClientConfig::new(&server, room, name)?
                .with_transport(transport)
                .with_reconnect(reconnect)
                .with_extensions(Extensions {
                    chat: !no_chat,
                    screen_share: !no_screen_share,
                })
                .with_max_ice_restarts(max_ice_restarts);

            join(config).await?;
        }
    }

    Ok(())
}

fn prompt_if_missing(value: Option<String>, prompt: &str, flag: &str) -> Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }
    if !std::io::stdin().is_terminal() {
        bail!("{flag} is required when stdin is not a terminal");
    }
    Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .with_context(|| format!("failed to read {flag}"))
}

async fn join(config: ClientConfig) -> Result<()> {
    let observer = Arc::new(ConsoleObserver::new(config.participant.clone()));
    println!(
        "{} {} as {}",
        "📞 Joining".green().bold(),
        config.room,
        config.participant
    );

    let (client, handle) = RoomClient::new(
        config,
        Arc::new(SyntheticMediaSource::new()),
        Arc::new(WebRtcTransportFactory),
        observer,
    );
    let mut task = client.spawn();
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) => {
                    if !run_command(&handle, line.trim()).await? {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut task => return Ok(()),
        }
    }

    // The actor may already be gone; leaving twice is harmless.
    let _ = handle.leave().await;
    task.await.context("room task panicked")?;
    Ok(())
}

/// Returns false when the user asked to quit.
async fn run_command(handle: &RoomHandle, line: &str) -> Result<bool> {
    match line {
        "" => {}
        "/quit" | "/leave" => return Ok(false),
        "/mute" => handle.toggle_audio().await?,
        "/video" => handle.toggle_video().await?,
        "/share" => handle.toggle_screen_share().await?,
        "/camera" => handle.switch_camera().await?,
        "/rejoin" => handle.rejoin().await?,
        "/help" => print_help(),
        other if other.starts_with('/') => {
            println!("{} {other}, try /help", "unknown command".yellow());
        }
        text => handle.send_chat(text).await?,
    }
    Ok(true)
}

fn print_help() {
    println!(
        "{}",
        "commands: /mute /video /share /camera /rejoin /quit, anything else is chat".dimmed()
    );
}
