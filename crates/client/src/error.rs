use aistudio_core::simulator::OVERLOAD_MESSAGE;

/// Fallback message when an error response carries no usable body.
pub const REQUEST_FAILED: &str = "Request failed";

/// Errors from talking to the studio API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The caller cancelled the request before it settled.
    #[error("Request cancelled")]
    Cancelled,

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never completed (connection, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether this is the transient overload failure that may be retried.
    pub fn is_overloaded(&self) -> bool {
        matches!(self, ClientError::Api { message, .. } if message.contains(OVERLOAD_MESSAGE))
    }
}
