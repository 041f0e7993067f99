//! Remote script execution handler.
//!
//! Provides:
//! - `ScriptEngine` - Embedded QuickJS context that persists across payloads
//! - `RemoteExecute` - Handler for `jsCode` payloads
//! - Approval handler trait for gating execution
//!
//! # Trust boundary
//!
//! `RemoteExecute` lets the server run code inside this client. The script
//! context has no filesystem, network or process APIs, and runs under
//! memory, stack and optional time limits, but anything the host places in
//! the context is reachable. Choose a [`TrustMode`] that matches how far the
//! push channel is actually trusted.

pub mod approvals;
pub mod config;
pub mod engine;
pub mod handler;

use std::time::Duration;

use push_dispatch_core::HandlerError;
use thiserror::Error;

pub use approvals::{ApprovalError, ApprovalHandler, ApprovalResult, AutoApproveHandler, DenyAllHandler};
pub use config::{ExecutorConfig, TrustMode};
pub use engine::ScriptEngine;
pub use handler::RemoteExecute;

/// Execution error.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The script raised; the message is the engine's own text.
    #[error("{message}")]
    Script { message: String },
    #[error("Script interrupted after exceeding {0:?}")]
    TimedOut(Duration),
    #[error("Remote execution denied: {0}")]
    Denied(String),
    #[error("Remote execution is disabled")]
    Disabled,
    #[error("Approval handler unavailable")]
    ApprovalUnavailable,
    #[error("Approval failed: {0}")]
    Approval(#[from] ApprovalError),
    #[error("Script engine error: {0}")]
    Engine(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rquickjs::Error> for ExecuteError {
    fn from(e: rquickjs::Error) -> Self {
        Self::Engine(e.to_string())
    }
}

impl From<ExecuteError> for HandlerError {
    fn from(e: ExecuteError) -> Self {
        Self::failed(e)
    }
}
