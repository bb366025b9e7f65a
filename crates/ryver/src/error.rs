use thiserror::Error;

use crate::{normalize::NormalizeError, signature::VerifyError};

/// Crate-wide result type for connector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed connector errors.
///
/// Propagation policy: signature failures terminate the HTTP request with
/// 401 and never enter the pipeline; identity and normalization failures
/// are logged and the request dropped; dispatch errors are returned to the
/// caller that invoked the send, which decides user-visible behavior. This
/// layer never retries.
#[derive(Debug, Error)]
pub enum Error {
    /// Inbound request failed webhook authentication.
    #[error(transparent)]
    Signature(#[from] VerifyError),

    /// A request arrived before the startup identity fetch succeeded.
    #[error("bot identity not available")]
    IdentityUnavailable,

    /// User or channel could not be derived from the raw event.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// An outbound channel string failed to decode; nothing was sent.
    #[error("invalid channel format: '{address}'")]
    InvalidChannelFormat { address: String },

    /// The REST API answered with a non-success status.
    #[error("ryver api returned status {status}: {body}")]
    RemoteApi {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The startup identity fetch returned an unexpected shape.
    #[error("bot identity response was not in the expected format")]
    MalformedIdentityResponse,

    /// Transport-level failure from the HTTP client.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
