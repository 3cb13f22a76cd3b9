//! Error types shared by the Warden crates
//!
//! Errors carry enough context (the operation or the kubeconfig path) to tell
//! an operator what to fix without re-running with debug logging.

use thiserror::Error;

/// Main error type for Warden operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Client configuration error (kubeconfig, impersonation, timeouts)
    #[error("config error [{context}]: {message}")]
    Config {
        /// Description of what's wrong
        message: String,
        /// Where the configuration came from (a path, an env var, ...)
        context: String,
    },

    /// A bounded wait ran out of time
    #[error("timed out after {elapsed_ms}ms waiting for {operation}")]
    Timeout {
        /// The operation that was being waited on
        operation: String,
        /// How long the caller waited
        elapsed_ms: u128,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "client_for", "load_kubeconfig")
        context: String,
    },
}

impl Error {
    /// Create a config error with the source of the configuration
    pub fn config_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Create a timeout error for an operation
    pub fn timeout(operation: impl Into<String>, elapsed: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms: elapsed.as_millis(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// 4xx responses from the apiserver are answers, not outages, so they are
    /// never retried. Config errors need a human.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::Config { .. } => false,
            Error::Timeout { .. } => true,
            Error::Internal { .. } => true,
        }
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Config { context, .. } => Some(context),
            Error::Internal { context, .. } => Some(context),
            _ => None,
        }
    }
}
