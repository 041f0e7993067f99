//! Approval handling for remote execution requests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use push_dispatch_core::ExecutePayload;

/// Result of an approval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "behavior", rename_all = "camelCase")]
pub enum ApprovalResult {
    /// Run the code, possibly rewritten by the approver.
    Allow { code: String },
    /// Refuse to run the code.
    Deny { message: String },
}

/// Approval error.
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Approval service unavailable")]
    ServiceUnavailable,
    #[error("Approval request failed: {0}")]
    RequestFailed(String),
}

/// Trait for deciding whether a remote payload may run.
///
/// Implement this trait to integrate with your approval UI or policy.
/// It runs on the dispatching thread and may block.
pub trait ApprovalHandler {
    /// Request approval for `payload`.
    ///
    /// # Errors
    /// Returns error if no decision could be obtained.
    fn request_approval(&self, payload: &ExecutePayload) -> Result<ApprovalResult, ApprovalError>;
}

impl<F> ApprovalHandler for F
where
    F: Fn(&ExecutePayload) -> Result<ApprovalResult, ApprovalError>,
{
    fn request_approval(&self, payload: &ExecutePayload) -> Result<ApprovalResult, ApprovalError> {
        self(payload)
    }
}

/// Approval handler that allows every payload unchanged.
#[derive(Debug, Default, Clone)]
pub struct AutoApproveHandler;

impl ApprovalHandler for AutoApproveHandler {
    fn request_approval(&self, payload: &ExecutePayload) -> Result<ApprovalResult, ApprovalError> {
        Ok(ApprovalResult::Allow {
            code: payload.code.clone(),
        })
    }
}

/// Approval handler that refuses every payload.
#[derive(Debug, Default, Clone)]
pub struct DenyAllHandler;

impl ApprovalHandler for DenyAllHandler {
    fn request_approval(&self, _payload: &ExecutePayload) -> Result<ApprovalResult, ApprovalError> {
        Ok(ApprovalResult::Deny {
            message: "remote execution is not permitted".to_string(),
        })
    }
}
