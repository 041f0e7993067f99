//! Channel bridge for notification UIs on another thread.
//!
//! The dispatching thread sends a [`Notification`] and blocks until the UI
//! side acknowledges it. The UI side must not run on the dispatching thread.

use std::sync::mpsc as std_mpsc;

use tokio::sync::mpsc;

use crate::{Notifier, NotifyError};

/// A notification waiting for the user.
#[derive(Debug)]
pub struct Notification {
    /// Text to display, unmodified.
    pub text: String,
    ack: std_mpsc::SyncSender<()>,
}

impl Notification {
    /// Acknowledge the notification, releasing the dispatching thread.
    ///
    /// Dropping a notification without calling this also releases it.
    pub fn acknowledge(self) {
        let _ = self.ack.send(());
    }
}

/// Notifier that forwards to a [`NotifyBridge`].
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier for ChannelNotifier {
    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let (ack, acked) = std_mpsc::sync_channel(1);
        self.tx
            .send(Notification {
                text: text.to_string(),
                ack,
            })
            .map_err(|_| NotifyError::Closed)?;
        // Err here means the notification was dropped, which counts as dismissed.
        let _ = acked.recv();
        Ok(())
    }
}

/// UI side of the notification bridge.
#[derive(Debug)]
pub struct NotifyBridge {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl NotifyBridge {
    /// Create a bridge.
    ///
    /// Returns the notifier for the dispatching side and the UI receiver.
    #[must_use]
    pub fn new() -> (ChannelNotifier, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNotifier { tx }, Self { rx })
    }

    /// Receive the next notification.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Receive the next notification, blocking the current thread.
    pub fn blocking_recv(&mut self) -> Option<Notification> {
        self.rx.blocking_recv()
    }

    /// Receive a notification (non-blocking).
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}
