use reqwest::StatusCode;

/// Failures surfaced by the API layer. Nothing here is fatal: callers decide
/// whether to show the message inline, as a notification, or to resync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never completed (connection refused, timeout, DNS...).
    #[error("Network error: {0}")]
    Network(String),
    /// 401: missing, invalid or expired session.
    #[error("{0}")]
    Auth(String),
    /// Rejected payload, either by local checks or by the server (400/422).
    #[error("{0}")]
    Validation(String),
    /// 404: the id is stale or belongs to someone else.
    #[error("{0}")]
    NotFound(String),
    #[error("Server error ({status}): {detail}")]
    Server { status: u16, detail: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("An unexpected error occurred")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Auth(detail),
            StatusCode::NOT_FOUND => ApiError::NotFound(detail),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(detail)
            }
            _ => ApiError::Server {
                status: status.as_u16(),
                detail,
            },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
