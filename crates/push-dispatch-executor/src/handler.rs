//! `jsCode` handler.

use std::sync::Arc;

use push_dispatch_core::{ExecutePayload, Handler, HandlerError, JS_CODE, PayloadLog};
use serde_json::Value;

use crate::{
    ApprovalHandler, ApprovalResult, ExecuteError, ExecutorConfig, ScriptEngine, TrustMode,
};

/// Handler executing server-supplied code in the client's script context.
///
/// The code runs verbatim and synchronously; the handler returns only after
/// it finishes. Script failures are returned to the caller untouched.
pub struct RemoteExecute {
    engine: ScriptEngine,
    trust: TrustMode,
    record_payloads: bool,
    approval_handler: Option<Box<dyn ApprovalHandler>>,
    payload_log: Option<Arc<PayloadLog>>,
}

impl RemoteExecute {
    /// Create a handler around an existing engine.
    #[must_use]
    pub fn new(engine: ScriptEngine, config: &ExecutorConfig) -> Self {
        match config.trust {
            TrustMode::TrustedChannel => tracing::warn!(
                "Remote execution enabled: the push channel can run arbitrary script in this client"
            ),
            TrustMode::RequireApproval => {
                tracing::info!("Remote execution enabled behind approval");
            }
            TrustMode::Disabled => tracing::info!("Remote execution disabled"),
        }
        Self {
            engine,
            trust: config.trust,
            record_payloads: config.record_payloads,
            approval_handler: None,
            payload_log: None,
        }
    }

    /// Create a handler with a fresh engine.
    ///
    /// # Errors
    /// Returns error if the engine cannot be created.
    pub fn from_config(config: &ExecutorConfig) -> Result<Self, ExecuteError> {
        Ok(Self::new(ScriptEngine::new(config)?, config))
    }

    /// Set the approval handler consulted in `RequireApproval` mode.
    #[must_use]
    pub fn with_approval_handler(mut self, handler: impl ApprovalHandler + 'static) -> Self {
        self.approval_handler = Some(Box::new(handler));
        self
    }

    /// Record received payloads in `log`.
    #[must_use]
    pub fn with_payload_log(mut self, log: Arc<PayloadLog>) -> Self {
        self.payload_log = Some(log);
        self
    }

    /// The script engine payloads run in.
    #[must_use]
    pub const fn engine(&self) -> &ScriptEngine {
        &self.engine
    }

    /// Execute a decoded payload.
    ///
    /// # Errors
    /// Returns error if execution is refused or the code fails.
    pub fn execute(&self, payload: &ExecutePayload) -> Result<(), ExecuteError> {
        let code = self.authorize(payload)?;
        self.engine.execute(&code)
    }

    fn authorize(&self, payload: &ExecutePayload) -> Result<String, ExecuteError> {
        match self.trust {
            TrustMode::TrustedChannel => Ok(payload.code.clone()),
            TrustMode::Disabled => Err(ExecuteError::Disabled),
            TrustMode::RequireApproval => {
                let handler = self
                    .approval_handler
                    .as_ref()
                    .ok_or(ExecuteError::ApprovalUnavailable)?;

                match handler.request_approval(payload)? {
                    ApprovalResult::Allow { code } => {
                        if code != payload.code {
                            tracing::debug!("Approval handler rewrote payload code");
                        }
                        Ok(code)
                    }
                    ApprovalResult::Deny { message } => {
                        tracing::warn!(%message, "Remote execution denied");
                        Err(ExecuteError::Denied(message))
                    }
                }
            }
        }
    }
}

impl Handler for RemoteExecute {
    fn handle(&self, payload: &Value) -> Result<(), HandlerError> {
        tracing::info!(%payload, "Received remote execution payload");
        if self.record_payloads {
            if let Some(log) = &self.payload_log {
                log.record(JS_CODE, payload.clone());
            }
        }

        let payload = ExecutePayload::decode(payload)?;
        self.execute(&payload)?;
        Ok(())
    }
}

impl std::fmt::Debug for RemoteExecute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteExecute")
            .field("engine", &self.engine)
            .field("trust", &self.trust)
            .field("has_approval_handler", &self.approval_handler.is_some())
            .finish_non_exhaustive()
    }
}
