//! Error types for ENAA
//!
//! One enum for the whole crate. Each variant maps to an HTTP status and a
//! stable machine-readable code used by the RPC layer.

use hyper::StatusCode;
use serde::Serialize;

/// Main error type for ENAA operations
#[derive(Debug, thiserror::Error)]
pub enum EnaaError {
    /// Credential rejection or identity-provider failure on an auth call
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Profile could not be fetched for an authenticated user
    #[error("Profile lookup failed: {0}")]
    ProfileLookup(String),

    /// Required environment variables are absent (every missing name listed)
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Hosted backend returned an error or was unreachable
    #[error("Backend error: {0}")]
    Backend(String),

    /// Local snapshot storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to RPC callers
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

impl EnaaError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::ProfileLookup(_) => StatusCode::NOT_FOUND,
            Self::MissingEnv(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code surfaced to RPC callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AUTH_ERROR",
            Self::ProfileLookup(_) => "PROFILE_NOT_FOUND",
            Self::MissingEnv(_) | Self::Config(_) => "CONFIGURATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Storage(_) | Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Structured body for the RPC response
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        }
    }

    /// Convert to status code and JSON body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = serde_json::to_string(&self.to_body())
            .unwrap_or_else(|_| format!("{{\"error\":{{\"code\":\"{}\"}}}}", self.code()));
        (status, body)
    }
}

impl From<std::io::Error> for EnaaError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for EnaaError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for EnaaError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for EnaaError {
    fn from(err: reqwest::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Result type alias for ENAA operations
pub type Result<T> = std::result::Result<T, EnaaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_lists_every_name() {
        let err = EnaaError::MissingEnv(vec!["SUPABASE_URL".into(), "AUTH_SECRET".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: SUPABASE_URL, AUTH_SECRET"
        );
    }

    #[test]
    fn test_authorization_codes_are_distinct() {
        let unauthorized = EnaaError::Unauthorized("no session".into());
        let forbidden = EnaaError::Forbidden("teachers only".into());

        assert_eq!(unauthorized.code(), "UNAUTHORIZED");
        assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.code(), "FORBIDDEN");
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_body_shape() {
        let (status, body) = EnaaError::Forbidden("nope".into()).into_status_code_and_body();
        assert_eq!(status, StatusCode::FORBIDDEN);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["error"]["message"], "Forbidden: nope");
    }
}
