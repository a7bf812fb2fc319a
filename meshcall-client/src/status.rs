use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::room::RoomObserver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// One user-visible, timestamped status line.
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub at: DateTime<Local>,
    pub level: StatusLevel,
    pub text: String,
}

impl StatusLine {
    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.at.format("%H:%M:%S"), self.text)
    }
}

/// Writes status lines to the log and to the room observer.
#[derive(Clone)]
pub struct StatusLog {
    observer: Arc<dyn RoomObserver>,
}

impl StatusLog {
    pub fn new(observer: Arc<dyn RoomObserver>) -> Self {
        Self { observer }
    }

    pub async fn info(&self, text: impl Into<String>) {
        let text = text.into();
        info!(status = %text);
        self.emit(StatusLevel::Info, text).await;
    }

    pub async fn error(&self, text: impl Into<String>) {
        let text = text.into();
        warn!(status = %text);
        self.emit(StatusLevel::Error, text).await;
    }

    async fn emit(&self, level: StatusLevel, text: String) {
        let line = StatusLine {
            at: Local::now(),
            level,
            text,
        };
        self.observer.on_status(&line).await;
    }
}
