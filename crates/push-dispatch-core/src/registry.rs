//! Dispatcher registry mapping message type names to handlers.

use std::collections::HashMap;

use serde_json::Value;

use crate::{Envelope, Handler, HandlerError};

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// A handler was found and returned normally.
    Handled,
    /// No handler is registered for the type name.
    Unrouted,
}

/// Registry of handlers, keyed by message type name.
///
/// Built once at client startup and then owned by the transport loop.
/// Holds at most one handler per name; registering a name again replaces
/// the previous handler.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the handler for `type_name`.
    pub fn register(&mut self, type_name: impl Into<String>, handler: impl Handler + 'static) {
        let type_name = type_name.into();
        if self.handlers.insert(type_name.clone(), Box::new(handler)).is_some() {
            tracing::debug!(%type_name, "Replaced handler");
        } else {
            tracing::debug!(%type_name, "Registered handler");
        }
    }

    /// Builder-style `register`.
    #[must_use]
    pub fn with(mut self, type_name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.register(type_name, handler);
        self
    }

    /// Route `payload` to the handler for `type_name`.
    ///
    /// The handler runs to completion on the calling thread before this
    /// returns. An unregistered type name is not an error.
    ///
    /// # Errors
    /// Returns the handler's error unchanged.
    pub fn dispatch(&self, type_name: &str, payload: &Value) -> Result<Routing, HandlerError> {
        let Some(handler) = self.handlers.get(type_name) else {
            tracing::trace!(type_name, "No handler registered");
            return Ok(Routing::Unrouted);
        };
        handler.handle(payload)?;
        Ok(Routing::Handled)
    }

    /// Route an envelope.
    ///
    /// # Errors
    /// Returns the handler's error unchanged.
    pub fn dispatch_envelope(&self, envelope: &Envelope) -> Result<Routing, HandlerError> {
        self.dispatch(&envelope.message_type, &envelope.message)
    }

    /// Whether a handler is registered for `type_name`.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("types", &self.registered_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use serde_json::json;

    use super::*;

    fn recorder(tag: &'static str, calls: Rc<RefCell<Vec<String>>>) -> impl Handler {
        move |payload: &Value| -> Result<(), HandlerError> {
            calls.borrow_mut().push(format!("{tag}:{payload}"));
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_invokes_registered_handler() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let dispatcher = Dispatcher::new().with("userMessage", recorder("notify", Rc::clone(&calls)));

        let routing = dispatcher.dispatch("userMessage", &json!("hello")).unwrap();
        assert_eq!(routing, Routing::Handled);
        assert_eq!(*calls.borrow(), vec![r#"notify:"hello""#.to_string()]);
    }

    #[test]
    fn test_unregistered_type_is_silent_noop() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let dispatcher = Dispatcher::new().with("userMessage", recorder("notify", Rc::clone(&calls)));

        let routing = dispatcher.dispatch("unknown", &json!("hello")).unwrap();
        assert_eq!(routing, Routing::Unrouted);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("jsCode", recorder("old", Rc::clone(&calls)));
        dispatcher.register("jsCode", recorder("new", Rc::clone(&calls)));

        assert_eq!(dispatcher.len(), 1);
        dispatcher.dispatch("jsCode", &json!({ "code": "1" })).unwrap();
        assert_eq!(calls.borrow().len(), 1);
        assert!(calls.borrow()[0].starts_with("new:"));
    }

    #[test]
    fn test_repeat_dispatch_is_not_deduplicated() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let dispatcher = Dispatcher::new().with("userMessage", recorder("notify", Rc::clone(&calls)));

        let env = Envelope::new("userMessage", json!("same"));
        dispatcher.dispatch_envelope(&env).unwrap();
        dispatcher.dispatch_envelope(&env).unwrap();
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_handler_error_passes_through() {
        let dispatcher = Dispatcher::new().with("jsCode", |_: &Value| -> Result<(), HandlerError> {
            Err(HandlerError::failed("script failed"))
        });

        let err = dispatcher.dispatch("jsCode", &Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "script failed");
    }

    #[test]
    fn test_registered_types_sorted() {
        let dispatcher = Dispatcher::new()
            .with("userMessage", |_: &Value| -> Result<(), HandlerError> { Ok(()) })
            .with("jsCode", |_: &Value| -> Result<(), HandlerError> { Ok(()) });
        assert_eq!(dispatcher.registered_types(), vec!["jsCode", "userMessage"]);
        assert!(dispatcher.contains("jsCode"));
        assert!(!dispatcher.is_empty());
    }
}
