//! # Notifications
//!
//! User-facing outcome messages ("toasts"). Stores report through the
//! [`Notifier`] trait and never return UI concerns to their callers.
//!
//! ```text
//! Store ──► Notifier::notify ──┬──► TracingNotifier  (log only)
//!                              └──► ChannelNotifier  (mpsc → UI task)
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Notification {
            kind,
            message: message.into(),
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::new(NotificationKind::Success, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::new(NotificationKind::Error, message));
    }
}

/// Writes notifications to the log. Used by headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success | NotificationKind::Info => {
                info!(kind = ?notification.kind, "{}", notification.message)
            }
            NotificationKind::Warning => warn!("{}", notification.message),
            NotificationKind::Error => error!("{}", notification.message),
        }
    }
}

/// Forwards notifications to a UI task over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("Notification dropped, receiver closed");
        }
    }
}
