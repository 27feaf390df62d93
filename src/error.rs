//! Error types for the Gfycat API client

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) const UNAUTHORIZED_CODE: &str = "Unauthorized";
pub(crate) const UNAUTHORIZED_DESCRIPTION: &str =
    "A valid access token is required to access this resource";

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token was rejected, even after one refresh attempt
    #[error("Unauthorized ({code}): {description}")]
    Unauthorized { code: String, description: String },

    /// The server answered with a non-success status and a structured error body
    #[error("API error {status} ({code}): {description}")]
    Api {
        status: StatusCode,
        code: String,
        description: String,
    },

    /// A response body did not match the expected shape
    #[error("Malformed response (HTTP {status}): {message}")]
    MalformedResponse { status: StatusCode, message: String },

    /// The request was aborted by a cancellation token
    #[error("Request cancelled")]
    Cancelled,

    /// The authentication container could not obtain new credentials
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Network or protocol failure below the API layer
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A request body could not be serialized
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The endpoint could not be turned into a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Arguments rejected before any request was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An upload finished in a state other than complete
    #[error("Upload did not complete: {0}")]
    UploadIncomplete(String),
}

impl ApiError {
    /// Terminal authorization failure raised by the authorization check
    pub(crate) fn unauthorized() -> Self {
        ApiError::Unauthorized {
            code: UNAUTHORIZED_CODE.to_string(),
            description: UNAUTHORIZED_DESCRIPTION.to_string(),
        }
    }

    /// Build an error from a non-success response body.
    ///
    /// The HTTP status is attached out of band; it is never read from the body.
    pub(crate) fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => {
                let (code, description) = match parsed.into_parts() {
                    (None, None) => {
                        return ApiError::MalformedResponse {
                            status,
                            message: "error body carries neither code nor description".to_string(),
                        };
                    }
                    (code, description) => (code.unwrap_or_default(), description.unwrap_or_default()),
                };
                if status == StatusCode::UNAUTHORIZED {
                    ApiError::Unauthorized { code, description }
                } else {
                    ApiError::Api {
                        status,
                        code,
                        description,
                    }
                }
            }
            Err(e) => ApiError::MalformedResponse {
                status,
                message: format!("unparseable error body: {}", e),
            },
        }
    }

    /// HTTP status associated with this error, if any
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Api { status, .. } | ApiError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            ApiError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Server supplied error code, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { code, .. } | ApiError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if the caller has to acquire new credentials
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::RefreshFailed(_)
        )
    }

    /// Check if this error is due to cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

/// Error payload returned by the service.
///
/// Some endpoints answer `{code, description}`, others `{code, message}` or
/// wrap the pair in an `errorMessage` object.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "message")]
    description: Option<String>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<Box<ErrorBody>>,
}

impl ErrorBody {
    fn into_parts(self) -> (Option<String>, Option<String>) {
        let (inner_code, inner_description) = self
            .error_message
            .map(|inner| inner.into_parts())
            .unwrap_or_default();

        (self.code.or(inner_code), self.description.or(inner_description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_with_description() {
        let err = ApiError::from_error_body(
            StatusCode::NOT_FOUND,
            br#"{"code":"NotFound","description":"gfy missing"}"#,
        );
        match err {
            ApiError::Api {
                status,
                code,
                description,
            } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(code, "NotFound");
                assert_eq!(description, "gfy missing");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_body_with_message_alias() {
        let err = ApiError::from_error_body(
            StatusCode::BAD_REQUEST,
            br#"{"code":"InvalidTitle","message":"too long"}"#,
        );
        assert_eq!(err.code(), Some("InvalidTitle"));
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_nested_error_message() {
        let err = ApiError::from_error_body(
            StatusCode::FORBIDDEN,
            br#"{"errorMessage":{"code":"Forbidden","description":"not yours"}}"#,
        );
        assert_eq!(err.code(), Some("Forbidden"));
        assert_eq!(err.status_code(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_unauthorized_body_maps_to_unauthorized() {
        let err = ApiError::from_error_body(
            StatusCode::UNAUTHORIZED,
            br#"{"code":"Unauthorized","description":"expired"}"#,
        );
        assert!(err.requires_login());
        assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_unparseable_body_is_malformed() {
        let err = ApiError::from_error_body(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert!(matches!(
            err,
            ApiError::MalformedResponse { status, .. } if status == StatusCode::BAD_GATEWAY
        ));
    }

    #[test]
    fn test_body_without_error_fields_is_malformed() {
        let bodies: [&[u8]; 3] = [b"{}", b"[]", br#"{"unrelated":1}"#];
        for body in bodies {
            let err = ApiError::from_error_body(StatusCode::INTERNAL_SERVER_ERROR, body);
            assert!(
                matches!(err, ApiError::MalformedResponse { .. }),
                "unexpected {:?}",
                err
            );
            assert_eq!(err.code(), None);
        }

        let err = ApiError::from_error_body(
            StatusCode::BAD_REQUEST,
            br#"{"errorMessage":{"description":"no code given"}}"#,
        );
        assert!(matches!(err, ApiError::Api { ref code, .. } if code.is_empty()));
    }
}
