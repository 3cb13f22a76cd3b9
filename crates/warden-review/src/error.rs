//! Errors returned by review surfaces

use thiserror::Error;

/// Error from submitting one access review.
///
/// The `Status` variant renders as the bare server message, e.g.
/// `subjectaccessreviews.authorization.k8s.io is forbidden: User "x" cannot
/// create resource "subjectaccessreviews" in API group "authorization.k8s.io"
/// at the cluster scope`, so expectations can match on server text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewError {
    /// The apiserver answered with a failure status
    #[error("{message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Machine-readable reason, e.g. `Forbidden`
        reason: String,
        /// Server message
        message: String,
    },

    /// The request never got an answer (connection, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// The answer could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// The surface does not serve this kind of review
    #[error("{surface} does not support {kind}")]
    Unsupported {
        /// Surface name
        surface: &'static str,
        /// What was asked for
        kind: String,
    },
}

impl ReviewError {
    /// HTTP status code if the server answered
    pub fn code(&self) -> Option<u16> {
        match self {
            ReviewError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for a 403 Forbidden answer
    pub fn is_forbidden(&self) -> bool {
        self.code() == Some(403)
    }
}

impl From<kube::Error> for ReviewError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => ReviewError::Status {
                code: resp.code,
                reason: resp.reason,
                message: resp.message,
            },
            kube::Error::SerdeError(e) => ReviewError::Decode(e.to_string()),
            other => ReviewError::Transport(other.to_string()),
        }
    }
}
