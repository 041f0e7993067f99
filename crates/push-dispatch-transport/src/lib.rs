//! Transport side of the push client.
//!
//! Provides:
//! - Inbound envelope sources (JSON lines, in-process channel)
//! - `PushClient` - Single-threaded dispatch loop with an error policy
//! - `ClientConfig` - JSON configuration for the client

pub mod client;
pub mod config;
pub mod protocol;

pub use client::{ClientError, ClientStats, ErrorPolicy, PushClient, register_default_handlers};
pub use config::{CONFIG_ENV, ClientConfig, ConfigError};
pub use protocol::{EnvelopeStream, TransportError, channel, json_lines, to_json_line};
