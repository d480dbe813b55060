// ABOUTME: Notification system for displaying temporary messages to users
// Errors stay until dismissed; dismissed keys are remembered so the same message is not raised again

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Key prefixes whose suffix is a session or placeholder id.
const SESSION_SCOPED: [&str; 3] = ["create-failed", "remove-failed", "terminal-write"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    /// Stable identity of the condition this reports, e.g. `create-failed:<placeholder>`.
    pub key: Option<String>,
    pub message: String,
    pub notification_type: NotificationType,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.notification_type != NotificationType::Error && now.duration_since(self.created_at) > self.duration
    }
}

#[derive(Debug)]
pub struct Notifications {
    items: Vec<Notification>,
    dismissed: HashSet<String>,
    next_id: u64,
    duration: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            dismissed: HashSet::new(),
            next_id: 1,
            duration: Duration::from_secs(5),
        }
    }
}

impl Notifications {
    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationType::Success, None, message.into()).unwrap_or(0)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationType::Info, None, message.into()).unwrap_or(0)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationType::Error, None, message.into()).unwrap_or(0)
    }

    /// Raise an error tied to `key`. Returns `None` when that key was
    /// dismissed before or is already showing.
    pub fn error_once(&mut self, key: impl Into<String>, message: impl Into<String>) -> Option<u64> {
        let key = key.into();
        if self.items.iter().any(|n| n.key.as_deref() == Some(key.as_str())) {
            return None;
        }
        self.push(NotificationType::Error, Some(key), message.into())
    }

    fn push(&mut self, notification_type: NotificationType, key: Option<String>, message: String) -> Option<u64> {
        if let Some(key) = &key {
            if self.dismissed.contains(key) {
                return None;
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notification {
            id,
            key,
            message,
            notification_type,
            created_at: Instant::now(),
            duration: self.duration,
        });
        Some(id)
    }

    pub fn dismiss(&mut self, id: u64) {
        if let Some(pos) = self.items.iter().position(|n| n.id == id) {
            let removed = self.items.remove(pos);
            if let Some(key) = removed.key {
                self.dismissed.insert(key);
            }
        }
    }

    /// Dismiss the newest notification, if any.
    pub fn dismiss_latest(&mut self) -> bool {
        match self.items.last().map(|n| n.id) {
            Some(id) => {
                self.dismiss(id);
                true
            }
            None => false,
        }
    }

    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|n| !n.is_expired(now));
    }

    pub fn visible(&self) -> &[Notification] {
        &self.items
    }

    /// Forget dismissals tied to sessions or placeholders for which
    /// `still_exists` is false. Other keys are kept.
    pub fn forget_dismissed(&mut self, still_exists: impl Fn(&str) -> bool) {
        self.dismissed.retain(|key| match key.split_once(':') {
            Some((prefix, subject)) if SESSION_SCOPED.contains(&prefix) => still_exists(subject),
            _ => true,
        });
    }

    pub fn is_dismissed(&self, key: &str) -> bool {
        self.dismissed.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
