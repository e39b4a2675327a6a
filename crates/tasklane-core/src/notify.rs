use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotifyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget user feedback.
pub trait Notifier {
    fn notify(&mut self, message: &str, level: NotifyLevel);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotifyLevel,
    pub shown_at: Instant,
}

/// Holds at most one notification; a new one replaces whatever is showing,
/// and it disappears on its own once `ttl` has passed.
#[derive(Debug, Clone)]
pub struct NotificationSlot {
    current: Option<Notification>,
    ttl: Duration,
}

impl Default for NotificationSlot {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl NotificationSlot {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    pub fn show(&mut self, message: &str, level: NotifyLevel, now: Instant) {
        if let Some(previous) = self.current.as_ref() {
            debug!(replaced = %previous.message, "replacing visible notification");
        }
        self.current = Some(Notification {
            message: message.to_string(),
            level,
            shown_at: now,
        });
    }

    pub fn visible_at(&self, now: Instant) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|note| now.saturating_duration_since(note.shown_at) < self.ttl)
    }

    pub fn visible(&self) -> Option<&Notification> {
        self.visible_at(Instant::now())
    }

    pub fn dismiss_expired(&mut self, now: Instant) {
        if self.visible_at(now).is_none() {
            self.current = None;
        }
    }
}

impl Notifier for NotificationSlot {
    fn notify(&mut self, message: &str, level: NotifyLevel) {
        self.show(message, level, Instant::now());
    }
}
