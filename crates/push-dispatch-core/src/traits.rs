//! Handler trait and handler errors.

use serde_json::Value;
use thiserror::Error;

/// Boxed error raised by a handler's own work.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Handler error.
///
/// The dispatcher never wraps these; they reach the caller of `dispatch`
/// exactly as the handler produced them.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Failed(BoxError),
}

impl HandlerError {
    /// Wrap a handler-specific error.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Downcast a handler-specific error.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Failed(inner) => inner.downcast_ref::<E>(),
            Self::InvalidPayload(_) => None,
        }
    }
}

/// Trait for message handlers.
///
/// Handlers run synchronously on the client's control thread and are
/// not required to be `Send`.
pub trait Handler {
    /// Handle one message payload.
    ///
    /// # Errors
    /// Returns error if the payload is malformed or the handler's work fails.
    fn handle(&self, payload: &Value) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Value) -> Result<(), HandlerError>,
{
    fn handle(&self, payload: &Value) -> Result<(), HandlerError> {
        self(payload)
    }
}

impl<H: Handler + ?Sized> Handler for std::rc::Rc<H> {
    fn handle(&self, payload: &Value) -> Result<(), HandlerError> {
        (**self).handle(payload)
    }
}

impl<H: Handler + ?Sized> Handler for std::sync::Arc<H> {
    fn handle(&self, payload: &Value) -> Result<(), HandlerError> {
        (**self).handle(payload)
    }
}
