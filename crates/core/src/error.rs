//! Error types for the Wizard domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context has
//! its own error variant; all of them collapse onto the eight typed codes in
//! [`ErrorCode`] at a component boundary.

use thiserror::Error;

/// The eight typed backend error codes every component boundary normalizes onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    InvalidInput,
    AuthRequired,
    Conflict,
    UnsupportedOperation,
    Timeout,
    BackendUnavailable,
    Internal,
}

impl ErrorCode {
    /// `timeout` and `backend_unavailable` are the only retryable codes.
    pub fn retryable(self) -> bool {
        matches!(self, ErrorCode::Timeout | ErrorCode::BackendUnavailable)
    }

    /// Map a raw message to a code via a lexical rule table. Last-resort
    /// heuristic only — prefer typed error construction at the source.
    pub fn infer_from_message(message: &str) -> ErrorCode {
        let lower = message.to_lowercase();
        if lower.contains("not found") {
            ErrorCode::NotFound
        } else if lower.contains("timed out") || lower.contains("timeout") {
            ErrorCode::Timeout
        } else if lower.contains("already exists") || lower.contains("conflict") {
            ErrorCode::Conflict
        } else if lower.contains("permission denied") || lower.contains("unauthorized") {
            ErrorCode::AuthRequired
        } else if lower.contains("unavailable") || lower.contains("unreachable") {
            ErrorCode::BackendUnavailable
        } else if lower.contains("unsupported") || lower.contains("not implemented") {
            ErrorCode::UnsupportedOperation
        } else if lower.contains("invalid") || lower.contains("required") {
            ErrorCode::InvalidInput
        } else {
            ErrorCode::Internal
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::AuthRequired => "auth_required",
            ErrorCode::Conflict => "conflict",
            ErrorCode::UnsupportedOperation => "unsupported_operation",
            ErrorCode::Timeout => "timeout",
            ErrorCode::BackendUnavailable => "backend_unavailable",
            ErrorCode::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// The normalized error envelope returned at a component boundary.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub backend: Option<String>,
    pub message: String,
    pub retryable: bool,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let retryable = code.retryable();
        Self {
            code,
            backend: None,
            message: message.into(),
            retryable,
        }
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }
}

/// The top-level error type for all Wizard operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Normalize any variant into the boundary envelope described in §7.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            Error::Dispatch(e) => e.to_envelope(),
            Error::Gateway(e) => e.to_envelope(),
            Error::RateLimit(e) => e.to_envelope(),
            Error::Policy(e) => e.to_envelope(),
            Error::Sync(e) => e.to_envelope(),
            Error::Config { message } => ErrorEnvelope::new(ErrorCode::InvalidInput, message),
            Error::Serialization(e) => ErrorEnvelope::new(ErrorCode::Internal, e.to_string()),
            Error::Internal(message) => ErrorEnvelope::new(ErrorCode::Internal, message),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("command required")]
    EmptyInput,

    #[error("shell command rejected: {0}")]
    ShellRejected(String),

    #[error("internal dispatch error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            DispatchError::EmptyInput => ErrorEnvelope::new(ErrorCode::InvalidInput, self.to_string()),
            DispatchError::ShellRejected(_) => ErrorEnvelope::new(ErrorCode::InvalidInput, self.to_string()),
            DispatchError::Internal(_) => ErrorEnvelope::new(ErrorCode::Internal, self.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("daily budget exceeded")]
    BudgetExceeded,

    #[error("daily request cap exceeded")]
    RequestCapExceeded,

    #[error("prompt too large for cloud backend: {tokens} tokens exceeds ceiling {ceiling}")]
    Oversize { tokens: u32, ceiling: u32 },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("quota exceeded for provider {0}")]
    QuotaExceeded(String),

    #[error("backend call failed: {0}")]
    BackendFailed(String),

    #[error("backend call timed out after {0}ms")]
    Timeout(u64),
}

impl GatewayError {
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            GatewayError::BudgetExceeded | GatewayError::RequestCapExceeded => {
                ErrorEnvelope::new(ErrorCode::InvalidInput, self.to_string())
            }
            GatewayError::Oversize { .. } => ErrorEnvelope::new(ErrorCode::InvalidInput, self.to_string()),
            GatewayError::BackendUnavailable(_) => {
                ErrorEnvelope::new(ErrorCode::BackendUnavailable, self.to_string())
            }
            GatewayError::QuotaExceeded(_) => ErrorEnvelope::new(ErrorCode::InvalidInput, self.to_string()),
            GatewayError::BackendFailed(_) => ErrorEnvelope::new(ErrorCode::BackendUnavailable, self.to_string()),
            GatewayError::Timeout(_) => ErrorEnvelope::new(ErrorCode::Timeout, self.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded for tier {tier}, retry after {retry_after_secs}s")]
    Exceeded { tier: String, retry_after_secs: u64 },

    #[error("device {0} is blocked until the cooldown expires")]
    Blocked(String),
}

impl RateLimitError {
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(ErrorCode::UnsupportedOperation, self.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PolicyError {
    #[error("policy violation: {0}")]
    Violation(String),
}

impl PolicyError {
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(ErrorCode::InvalidInput, self.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("no credentials for provider {0}")]
    MissingCredentials(String),

    #[error("authentication failed for provider {0}")]
    AuthFailed(String),

    #[error("unknown provider key: {0}")]
    UnknownProvider(String),

    #[error("fetch failed for provider {provider}: {reason}")]
    FetchFailed { provider: String, reason: String },
}

impl SyncError {
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            SyncError::MissingCredentials(_) => ErrorEnvelope::new(ErrorCode::AuthRequired, self.to_string()),
            SyncError::AuthFailed(_) => ErrorEnvelope::new(ErrorCode::AuthRequired, self.to_string()),
            SyncError::UnknownProvider(_) => ErrorEnvelope::new(ErrorCode::NotFound, self.to_string()),
            SyncError::FetchFailed { .. } => ErrorEnvelope::new(ErrorCode::BackendUnavailable, self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_displays_correctly() {
        let err = Error::Gateway(GatewayError::Oversize {
            tokens: 7000,
            ceiling: 6000,
        });
        assert!(err.to_string().contains("7000"));
        assert!(err.to_string().contains("6000"));
    }

    #[test]
    fn envelope_marks_timeout_retryable() {
        let env = GatewayError::Timeout(500).to_envelope();
        assert_eq!(env.code, ErrorCode::Timeout);
        assert!(env.retryable);
    }

    #[test]
    fn envelope_marks_invalid_input_non_retryable() {
        let env = GatewayError::Oversize { tokens: 1, ceiling: 1 }.to_envelope();
        assert!(!env.retryable);
    }

    #[test]
    fn infer_from_message_finds_not_found() {
        assert_eq!(ErrorCode::infer_from_message("device not found"), ErrorCode::NotFound);
        assert_eq!(ErrorCode::infer_from_message("request timed out"), ErrorCode::Timeout);
        assert_eq!(
            ErrorCode::infer_from_message("resource already exists"),
            ErrorCode::Conflict
        );
    }
}
