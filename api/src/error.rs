//! Error taxonomy for backend API calls.

use thiserror::Error;

/// Errors that can occur when calling the raffle backend.
///
/// The variants are the client-observable taxonomy: workflow code matches on
/// them to decide whether to prompt an availability reload
/// ([`ApiError::NumbersInConflict`]), redirect to login
/// ([`ApiError::AuthRequired`]), or surface a generic failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be completed at all (DNS, connect, timeout)
    #[error("request could not be completed: {0}")]
    Network(String),

    /// The response body failed JSON parsing (e.g. an HTML error page)
    #[error("malformed response (status {status}): {reason}")]
    MalformedResponse {
        /// HTTP status of the offending response
        status: u16,
        /// Parse failure description
        reason: String,
    },

    /// One or more selected numbers are already taken or processing
    /// (race with another client; reload availability and re-select)
    #[error("numbers no longer available: {0}")]
    NumbersInConflict(String),

    /// The operation needs an organizer session (401/403)
    #[error("authentication required")]
    AuthRequired,

    /// The resource does not exist (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other rejection, with the backend's `detail` message when present
    #[error("server rejected the request (status {status}): {detail}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        detail: String,
    },
}

impl ApiError {
    /// Whether a retry of an *idempotent read* could plausibly succeed.
    ///
    /// 4xx responses are never transient: the backend made an authoritative
    /// decision and repeating the request verbatim cannot change it.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } | Self::MalformedResponse { status, .. } => *status >= 500,
            Self::NumbersInConflict(_) | Self::AuthRequired | Self::NotFound(_) => false,
        }
    }
}

/// Classify a non-2xx response body into an [`ApiError`].
///
/// The backend reports structured errors as `{"detail": "..."}` JSON; a body
/// that is not JSON at all (typically an HTML error page from a proxy) is
/// reported as a distinct malformed-response case rather than being
/// swallowed.
#[must_use]
pub fn classify_failure(status: u16, body: &[u8]) -> ApiError {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return ApiError::MalformedResponse {
            status,
            reason: "response body is not JSON".to_string(),
        };
    };

    let detail = value
        .get("detail")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| value.to_string(), ToString::to_string);

    match status {
        401 | 403 => ApiError::AuthRequired,
        404 => ApiError::NotFound(detail),
        400 => {
            // DRF reports number clashes either as a field error keyed by
            // "numbers" or as a detail message.
            if let Some(numbers) = value.get("numbers") {
                let message = numbers
                    .as_str()
                    .map_or_else(|| numbers.to_string(), ToString::to_string);
                ApiError::NumbersInConflict(message)
            } else if detail.contains("not available")
                || detail.contains("en proceso")
                || detail.contains("in process")
            {
                ApiError::NumbersInConflict(detail)
            } else {
                ApiError::Server { status, detail }
            }
        },
        _ => ApiError::Server { status, detail },
    }
}
