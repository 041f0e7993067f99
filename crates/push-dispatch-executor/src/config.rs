//! Executor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How far the push channel is trusted to run code on this client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    /// The channel is authenticated and owned by the same party as the
    /// client; every payload is executed.
    #[default]
    TrustedChannel,
    /// Each payload must be allowed by an approval handler first.
    RequireApproval,
    /// Remote execution is refused outright.
    Disabled,
}

/// Limits and trust settings for remote execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Trust placed in the push channel.
    pub trust: TrustMode,
    /// Heap limit for the script runtime, in bytes.
    pub memory_limit_bytes: Option<usize>,
    /// Stack limit for the script runtime, in bytes.
    pub max_stack_bytes: Option<usize>,
    /// Wall-clock limit for a single execution, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Record executed payloads in the payload log.
    pub record_payloads: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            trust: TrustMode::default(),
            memory_limit_bytes: Some(64 * 1024 * 1024),
            max_stack_bytes: Some(1024 * 1024),
            timeout_ms: None,
            record_payloads: true,
        }
    }
}

impl ExecutorConfig {
    /// Execution timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
