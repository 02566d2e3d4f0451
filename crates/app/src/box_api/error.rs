use common::remote::RemoteError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {status}: {message}")]
    HttpStatus {
        status: StatusCode,
        retry_after: Option<u64>,
        message: String,
    },
    #[error("access token is not a valid header value")]
    InvalidToken,
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<ApiError> for RemoteError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::HttpStatus {
                status,
                retry_after,
                message,
            } => match status {
                StatusCode::NOT_FOUND => RemoteError::NotFound(message),
                StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(message),
                StatusCode::FORBIDDEN => RemoteError::PermissionDenied(message),
                StatusCode::CONFLICT => RemoteError::Conflict(message),
                StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited { retry_after },
                _ => RemoteError::Transport(format!("HTTP {}: {}", status, message)),
            },
            ApiError::Reqwest(err) => RemoteError::Transport(err.to_string()),
            other => RemoteError::Default(anyhow::anyhow!(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: StatusCode) -> RemoteError {
        ApiError::HttpStatus {
            status,
            retry_after: Some(7),
            message: "nope".to_string(),
        }
        .into()
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status(StatusCode::NOT_FOUND), RemoteError::NotFound(m) if m == "nope"));
        assert!(matches!(
            status(StatusCode::UNAUTHORIZED),
            RemoteError::Unauthorized(_)
        ));
        assert!(matches!(
            status(StatusCode::FORBIDDEN),
            RemoteError::PermissionDenied(_)
        ));
        assert!(matches!(status(StatusCode::CONFLICT), RemoteError::Conflict(_)));
        assert!(matches!(
            status(StatusCode::TOO_MANY_REQUESTS),
            RemoteError::RateLimited {
                retry_after: Some(7)
            }
        ));
        assert!(matches!(
            status(StatusCode::BAD_GATEWAY),
            RemoteError::Transport(_)
        ));
    }

    #[test]
    fn test_unexpected_response_is_default() {
        let err: RemoteError = ApiError::UnexpectedResponse("empty upload".into()).into();
        assert!(matches!(err, RemoteError::Default(_)));
    }
}
