//! User-facing transient notifications.

use std::collections::VecDeque;

/// Oldest entries are dropped past this many
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

impl NotificationLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "[..]",
            NotificationLevel::Success => "[OK]",
            NotificationLevel::Error => "[!!]",
        }
    }
}

/// A notification entry with message and timestamp
#[derive(Debug, Clone)]
pub struct NotificationEntry {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl NotificationEntry {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: chrono::Local::now(),
        }
    }

    pub fn time_ago(&self) -> String {
        let now = chrono::Local::now();
        let duration = now.signed_duration_since(self.timestamp);
        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            self.timestamp.format("%m/%d %H:%M").to_string()
        }
    }
}

impl std::fmt::Display for NotificationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.level.tag(), self.message)
    }
}

/// Bounded notification queue
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    entries: VecDeque<NotificationEntry>,
}

impl Notifications {
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let entry = NotificationEntry::new(level, message);
        match level {
            NotificationLevel::Error => tracing::warn!("{}", entry.message),
            _ => tracing::info!("{}", entry.message),
        }
        self.entries.push_back(entry);
        while self.entries.len() > MAX_NOTIFICATIONS {
            self.entries.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }

    pub fn latest(&self) -> Option<&NotificationEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return everything queued so far
    pub fn drain(&mut self) -> Vec<NotificationEntry> {
        self.entries.drain(..).collect()
    }
}
