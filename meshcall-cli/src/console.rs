use async_trait::async_trait;
use colored::*;
use meshcall_client::{
    ChannelState, LocalMedia, PeerState, RemoteTrack, RoomObserver, StatusLine,
};
use meshcall_core::{Participant, ParticipantId};

/// Prints room activity to stdout.
pub struct ConsoleObserver {
    local: ParticipantId,
}

impl ConsoleObserver {
    pub fn new(local: ParticipantId) -> Self {
        Self { local }
    }
}

#[async_trait]
impl RoomObserver for ConsoleObserver {
    async fn on_room_state(&self, participants: &[Participant]) {
        let names: Vec<String> = participants
            .iter()
            .map(|p| {
                let mut name = if p.name == self.local {
                    format!("{} (you)", p.name).bold().to_string()
                } else {
                    p.name.to_string()
                };
                if p.audio_muted {
                    name.push_str(" [mic off]");
                }
                if p.video_muted {
                    name.push_str(" [cam off]");
                }
                name
            })
            .collect();
        println!("{} {}", "👥".cyan(), names.join(", "));
    }

    async fn on_local_media(&self, media: &LocalMedia) {
        for track in media.tracks() {
            let state = if track.enabled { "on" } else { "off" };
            println!("   {} {}: {} ({state})", "🎙".dimmed(), track.kind, track.label);
        }
    }

    async fn on_peer_state(&self, peer: &ParticipantId, state: PeerState) {
        let label = match state {
            PeerState::Connected => state.to_string().green(),
            PeerState::Degraded => state.to_string().yellow(),
            PeerState::Closed => state.to_string().red(),
            PeerState::Idle | PeerState::Negotiating => state.to_string().normal(),
        };
        println!("   {peer}: {label}");
    }

    async fn on_remote_track(&self, peer: &ParticipantId, track: &RemoteTrack) {
        println!("   {} receiving {} from {peer}", "📺".cyan(), track.kind);
    }

    async fn on_peer_removed(&self, peer: &ParticipantId) {
        println!("   {peer} left the call");
    }

    async fn on_chat(&self, from: Option<&ParticipantId>, text: &str) {
        let from = from.map(ToString::to_string).unwrap_or_else(|| "?".into());
        println!("{} {}", format!("<{from}>").magenta().bold(), text);
    }

    async fn on_screen_share(&self, from: Option<&ParticipantId>, sharing: bool) {
        let from = from.map(ToString::to_string).unwrap_or_else(|| "someone".into());
        let verb = if sharing { "started" } else { "stopped" };
        println!("   {} {from} {verb} sharing their screen", "🖥".cyan());
    }

    async fn on_channel_state(&self, state: ChannelState) {
        let text = match state {
            ChannelState::Connecting => "connecting to signaling".normal(),
            ChannelState::Open => "signaling connected".green(),
            ChannelState::Reconnecting { attempt } => {
                format!("signaling lost, reconnect attempt {attempt}").yellow()
            }
            ChannelState::Closed => "signaling closed".dimmed(),
            ChannelState::GaveUp => "signaling gave up, use /rejoin".red().bold(),
        };
        println!("{} {text}", "📡".cyan());
    }

    async fn on_status(&self, line: &StatusLine) {
        if line.is_error() {
            eprintln!("{}", line.to_string().red());
        } else {
            println!("{}", line.to_string().dimmed());
        }
    }
}
