use thiserror::Error;

/// Error from a single contract read call, whatever transport performed
/// it (native JSON-RPC client or a bridge invoker).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contract call `{method}` failed: {reason}")]
pub struct CallError {
    pub method: String,
    pub reason: Reason,
}

impl CallError {
    pub fn new(method: impl Into<String>, reason: Reason) -> Self {
        CallError {
            method: method.into(),
            reason,
        }
    }

    pub fn unsupported(method: impl Into<String>) -> Self {
        CallError::new(method, Reason::Unsupported)
    }

    pub fn reverted(method: impl Into<String>, detail: impl Into<String>) -> Self {
        CallError::new(method, Reason::Reverted(detail.into()))
    }

    pub fn transport(method: impl Into<String>, detail: impl Into<String>) -> Self {
        CallError::new(method, Reason::Transport(detail.into()))
    }

    pub fn bad_response(method: impl Into<String>, detail: impl Into<String>) -> Self {
        CallError::new(method, Reason::BadResponse(detail.into()))
    }
}

/// The reason for the call failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Reason {
    /// The target contract does not recognize the function selector.
    #[error("method not supported by the contract")]
    Unsupported,
    /// The call executed on chain and reverted.
    #[error("execution reverted: {0}")]
    Reverted(String),
    /// The layer below the call seam failed (rpc node unreachable, bridge
    /// refused, response truncated).
    #[error("transport error: {0}")]
    Transport(String),
    /// The call succeeded but the returned values had an unexpected shape.
    #[error("unexpected return data: {0}")]
    BadResponse(String),
}

impl Reason {
    /// Whether the failure signals that the capability is absent on the
    /// contract, as opposed to the call being transiently unlucky. Calling
    /// a missing function through a fallback handler surfaces as a revert,
    /// so reverts count as absence here.
    pub fn is_capability_absence(&self) -> bool {
        matches!(self, Reason::Unsupported | Reason::Reverted(_))
    }
}
