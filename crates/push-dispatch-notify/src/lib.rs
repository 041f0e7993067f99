//! Blocking user notification handler.
//!
//! Provides:
//! - `Notifier` - Trait for showing text and waiting for acknowledgement
//! - `UserNotify` - Handler for `userMessage` payloads
//! - Channel bridge for UIs running on another thread
//! - Terminal notifier (feature: terminal)

pub mod bridge;
pub mod handler;

#[cfg(feature = "terminal")]
pub mod terminal;

use thiserror::Error;

pub use bridge::{ChannelNotifier, Notification, NotifyBridge};
pub use handler::UserNotify;

#[cfg(feature = "terminal")]
pub use terminal::TerminalNotifier;

/// Notification error.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for presenting a notification to the user.
///
/// `notify` blocks the calling thread until the user acknowledges the
/// notification. The text is shown exactly as given.
pub trait Notifier {
    /// Show `text` and wait for acknowledgement.
    ///
    /// # Errors
    /// Returns error if the notification could not be shown.
    fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        (**self).notify(text)
    }
}

impl<N: Notifier + ?Sized> Notifier for std::rc::Rc<N> {
    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        (**self).notify(text)
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        (**self).notify(text)
    }
}
