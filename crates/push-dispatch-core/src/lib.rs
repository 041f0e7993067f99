//! Core abstractions for client-side push message dispatch.
//!
//! This crate provides the fundamental building blocks:
//! - `Envelope` - The `{ type, message }` unit delivered by the push channel
//! - `Dispatcher` - Owned registry routing a type name to its handler
//! - `Handler` - Trait implemented by every registered handler
//! - `PayloadLog` - Broadcast + history record of handled payloads

pub mod envelope;
pub mod payload_log;
pub mod registry;
pub mod traits;

pub use envelope::{Envelope, ExecutePayload, JS_CODE, NotifyPayload, PushMessage, USER_MESSAGE};
pub use payload_log::{PayloadLog, RecordedPayload};
pub use registry::{Dispatcher, Routing};
pub use traits::{Handler, HandlerError};
