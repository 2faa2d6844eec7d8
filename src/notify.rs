// src/notify.rs
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

/// User-facing notification service.
///
/// At most one notification is active. Showing a new one replaces the current
/// one; dismissing by id only clears it if that id is still the active one.
#[derive(Debug, Default)]
pub struct Notifier {
    active: Option<Notification>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a notification, replacing any active one. Returns its id.
    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let notification = Notification {
            id: self.next_id,
            kind,
            message: message.into(),
        };
        tracing::debug!(id = notification.id, %kind, message = notification.message, "Notification shown");
        self.active = Some(notification);
        self.next_id
    }

    /// Clears the active notification if it has the given id.
    pub fn dismiss(&mut self, id: u64) -> bool {
        if self.active.as_ref().is_some_and(|n| n.id == id) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub const fn active(&self) -> Option<&Notification> {
        self.active.as_ref()
    }

    /// Removes and returns the active notification.
    pub fn take(&mut self) -> Option<Notification> {
        self.active.take()
    }
}
