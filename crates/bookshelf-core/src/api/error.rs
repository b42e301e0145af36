use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Book not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request rejected ({status}): {body}")]
    ClientError { status: u16, body: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            404 => ApiError::NotFound(truncated),
            409 => ApiError::Conflict(truncated),
            code @ 400..=499 => ApiError::ClientError {
                status: code,
                body: truncated,
            },
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Short message suitable for a status bar or dialog banner
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound(_) => "That book no longer exists on the server".to_string(),
            ApiError::Conflict(_) => "The server rejected the change as conflicting".to_string(),
            ApiError::ClientError { status, .. } => format!("The server rejected the request ({})", status),
            ApiError::ServerError(_) => "The server failed to handle the request".to_string(),
            ApiError::Network(e) if e.is_timeout() => "Connection timed out. Please try again.".to_string(),
            ApiError::Network(_) => "Unable to connect to server. Check that the backend is running.".to_string(),
            ApiError::InvalidResponse(_) => "The server sent an unexpected response".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, "").is_not_found());
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, "dup"),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "bad"),
            ApiError::ClientError { status: 400, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::MOVED_PERMANENTLY, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError(msg) => {
                assert!(msg.len() < 600);
                assert!(msg.contains("2000 total bytes"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_not_found_is_distinct_from_generic_failure() {
        assert!(!ApiError::ServerError(String::new()).is_not_found());
        assert_eq!(
            ApiError::NotFound("gone".to_string()).user_message(),
            "That book no longer exists on the server"
        );
    }
}
