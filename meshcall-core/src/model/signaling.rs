use crate::model::participant::{Participant, ParticipantId};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(urls: Vec<String>) -> Self {
        Self {
            urls,
            username: None,
            credential: None,
        }
    }
}

// Browsers accept `urls` as either a single string or a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description in the shape produced by `RTCPeerConnection.localDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Reachability candidate in `RTCIceCandidateInit` JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// Every message carried by the signaling channel, discriminated by `type`.
///
/// `from` is stamped by the relay server; `to` is set by the sending client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalMessage {
    IceServers {
        #[serde(alias = "servers")]
        ice_servers: Vec<IceServerConfig>,
    },
    RoomState {
        #[serde(alias = "participants")]
        users: Vec<Participant>,
    },
    Offer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<ParticipantId>,
        sdp: SessionDescription,
    },
    Answer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<ParticipantId>,
        sdp: SessionDescription,
    },
    IceCandidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<ParticipantId>,
        candidate: IceCandidate,
    },
    MuteState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        #[serde(default, alias = "audioMuted")]
        audio_muted: bool,
        #[serde(default, alias = "videoMuted")]
        video_muted: bool,
    },
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        text: String,
    },
    ScreenShare {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
        sharing: bool,
    },
}

impl SignalMessage {
    /// Wire names of every variant, in declaration order.
    pub const KINDS: [&'static str; 8] = [
        "ice_servers",
        "room_state",
        "offer",
        "answer",
        "ice_candidate",
        "mute_state",
        "chat",
        "screen_share",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            Self::IceServers { .. } => "ice_servers",
            Self::RoomState { .. } => "room_state",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice_candidate",
            Self::MuteState { .. } => "mute_state",
            Self::Chat { .. } => "chat",
            Self::ScreenShare { .. } => "screen_share",
        }
    }

    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer { from, .. }
            | Self::Answer { from, .. }
            | Self::IceCandidate { from, .. }
            | Self::MuteState { from, .. }
            | Self::Chat { from, .. }
            | Self::ScreenShare { from, .. } => from.as_ref(),
            Self::IceServers { .. } | Self::RoomState { .. } => None,
        }
    }

    pub fn recipient(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer { to, .. } | Self::Answer { to, .. } | Self::IceCandidate { to, .. } => {
                to.as_ref()
            }
            _ => None,
        }
    }

    /// Returns the message with `from` replaced. Server-originated variants are unchanged.
    pub fn stamped(mut self, sender: &ParticipantId) -> Self {
        match &mut self {
            Self::Offer { from, .. }
            | Self::Answer { from, .. }
            | Self::IceCandidate { from, .. }
            | Self::MuteState { from, .. }
            | Self::Chat { from, .. }
            | Self::ScreenShare { from, .. } => *from = Some(sender.clone()),
            Self::IceServers { .. } | Self::RoomState { .. } => {}
        }
        self
    }
}
