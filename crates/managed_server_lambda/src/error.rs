use thiserror::Error;

/// Failures surfaced to the Lambda host, which turns them into a
/// platform-level error response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid invocation event: {0}")]
    MalformedEvent(#[source] serde_json::Error),

    #[error("malformed message body: {0}")]
    MalformedBody(String),

    #[error("state store failure: {0}")]
    StateStore(String),

    #[error("failed to serialize response body: {0}")]
    Serialization(#[from] serde_json::Error),
}
