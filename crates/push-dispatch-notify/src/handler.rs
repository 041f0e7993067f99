//! `userMessage` handler.

use push_dispatch_core::{Handler, HandlerError, NotifyPayload};
use serde_json::Value;

use crate::Notifier;

/// Handler surfacing a server-originated message to the user.
///
/// Each dispatch produces exactly one blocking notification with the
/// payload text, unmodified. Repeated payloads are not deduplicated.
#[derive(Debug, Clone)]
pub struct UserNotify<N> {
    notifier: N,
}

impl<N: Notifier> UserNotify<N> {
    /// Create a handler backed by `notifier`.
    #[must_use]
    pub const fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// The underlying notifier.
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }
}

impl<N: Notifier> Handler for UserNotify<N> {
    fn handle(&self, payload: &Value) -> Result<(), HandlerError> {
        let payload = NotifyPayload::decode(payload)?;
        tracing::debug!(len = payload.text().len(), "Showing user notification");
        self.notifier
            .notify(payload.text())
            .map_err(HandlerError::failed)?;
        tracing::trace!("User notification acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use push_dispatch_core::{Dispatcher, USER_MESSAGE};
    use serde_json::json;

    use super::*;
    use crate::NotifyError;

    #[derive(Default)]
    struct RecordingNotifier {
        shown: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, text: &str) -> Result<(), NotifyError> {
            self.shown.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    struct ClosedNotifier;

    impl Notifier for ClosedNotifier {
        fn notify(&self, _text: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Closed)
        }
    }

    #[test]
    fn test_notify_shows_exact_text() {
        let notifier = Rc::new(RecordingNotifier::default());
        let dispatcher = Dispatcher::new().with(USER_MESSAGE, UserNotify::new(Rc::clone(&notifier)));

        dispatcher.dispatch(USER_MESSAGE, &json!("  hello\n<b>world</b> ")).unwrap();
        assert_eq!(*notifier.shown.borrow(), vec!["  hello\n<b>world</b> ".to_string()]);
    }

    #[test]
    fn test_empty_string_is_shown() {
        let notifier = RecordingNotifier::default();
        UserNotify::new(&notifier).handle(&json!("")).unwrap();
        assert_eq!(*notifier.shown.borrow(), vec![String::new()]);
    }

    #[test]
    fn test_same_payload_twice_notifies_twice() {
        let notifier = RecordingNotifier::default();
        let handler = UserNotify::new(&notifier);
        handler.handle(&json!("hello")).unwrap();
        handler.handle(&json!("hello")).unwrap();
        assert_eq!(notifier.shown.borrow().len(), 2);
    }

    #[test]
    fn test_non_string_payload_is_rejected() {
        let notifier = RecordingNotifier::default();
        let err = UserNotify::new(&notifier).handle(&json!({ "text": "hi" })).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidPayload(_)));
        assert!(notifier.shown.borrow().is_empty());
    }

    #[test]
    fn test_notifier_failure_propagates() {
        let err = UserNotify::new(ClosedNotifier).handle(&json!("hi")).unwrap_err();
        assert!(matches!(err.downcast_ref::<NotifyError>(), Some(NotifyError::Closed)));
    }
}
