//! Error types for the SignalForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Dispatch entry points
//! convert these into a [`ResultEnvelope`](crate::envelope::ResultEnvelope)
//! at their boundary; nothing here is meant to reach an end user verbatim.

use thiserror::Error;

/// The top-level error type for all SignalForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Function errors ---
    #[error("Function error: {0}")]
    Function(#[from] FunctionError),

    // --- Thread run errors ---
    #[error("Thread run error: {0}")]
    Thread(#[from] ThreadError),

    // --- Caller input ---
    #[error("Validation error: {0}")]
    Validation(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the model or embedding provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Failures resolving, validating or running a registered function.
#[derive(Debug, Clone, Error)]
pub enum FunctionError {
    #[error("Function \"{name}\" not found. Available functions are: {}", available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("Function group not found: {0}")]
    GroupNotFound(String),

    #[error("Invalid function arguments: {0}")]
    InvalidArguments(String),

    #[error("Arguments for \"{function}\" failed validation: {reason}")]
    ArgumentValidation { function: String, reason: String },

    #[error("Error executing function \"{function}\": {reason}")]
    ExecutionFailed { function: String, reason: String },
}

/// Failures of the asynchronous thread-run surface.
#[derive(Debug, Clone, Error)]
pub enum ThreadError {
    #[error("Thread run ended with status {status}: {reason}")]
    RunTerminalFailure { status: String, reason: String },

    #[error("Thread run did not finish after {iterations} polls ({elapsed_secs}s)")]
    PollTimeout { iterations: u32, elapsed_secs: u64 },

    #[error("Thread {0} has no text response")]
    NoTextResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn function_not_found_lists_available_names() {
        let err = FunctionError::NotFound {
            name: "classify".into(),
            available: vec!["predictObjectParent".into(), "summarise".into()],
        };
        assert_eq!(
            err.to_string(),
            "Function \"classify\" not found. Available functions are: predictObjectParent, summarise"
        );
    }

    #[test]
    fn poll_timeout_reports_bound() {
        let err = Error::from(ThreadError::PollTimeout {
            iterations: 120,
            elapsed_secs: 61,
        });
        assert!(err.to_string().contains("120 polls"));
    }
}
