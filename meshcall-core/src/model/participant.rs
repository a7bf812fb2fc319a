use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Display name of a participant. Unique within a room, immutable for the
/// lifetime of a signaling connection.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a `room_state` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: ParticipantId,
    #[serde(default, alias = "audioMuted")]
    pub audio_muted: bool,
    #[serde(default, alias = "videoMuted")]
    pub video_muted: bool,
}

impl Participant {
    pub fn new(name: impl Into<ParticipantId>) -> Self {
        Self {
            name: name.into(),
            audio_muted: false,
            video_muted: false,
        }
    }
}
