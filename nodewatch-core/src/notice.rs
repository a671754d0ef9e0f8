use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// How long a rejected-start message stays visible.
pub const ERROR_DISPLAY_WINDOW: Duration = Duration::from_secs(3);

const MAX_NOTICES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub at: DateTime<Local>,
    pub level: NoticeLevel,
    pub message: String,
}

/// Bounded log of user-facing messages. Everything pushed here is also
/// emitted through `tracing`.
#[derive(Debug, Default)]
pub struct Notices {
    entries: VecDeque<Notice>,
}

impl Notices {
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info => info!("{}", message),
            NoticeLevel::Warn => warn!("{}", message),
            NoticeLevel::Error => error!("{}", message),
        }

        self.entries.push_back(Notice {
            at: Local::now(),
            level,
            message,
        });
        while self.entries.len() > MAX_NOTICES {
            self.entries.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.entries.back()
    }
}

/// The single error line shown above the node list.
#[derive(Debug, Default, Clone)]
pub struct ErrorBanner {
    message: Option<String>,
    expires_at: Option<Instant>,
}

impl ErrorBanner {
    /// Show until the next `clear`.
    pub fn set(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.expires_at = None;
    }

    /// Show for [`ERROR_DISPLAY_WINDOW`] from `now`.
    pub fn flash(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.expires_at = Some(now + ERROR_DISPLAY_WINDOW);
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.expires_at = None;
    }

    pub fn visible(&self, now: Instant) -> Option<&str> {
        match self.expires_at {
            Some(deadline) if now >= deadline => None,
            _ => self.message.as_deref(),
        }
    }
}
