use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request body")]
    InvalidRequestBody,

    #[error("Input too long")]
    InputTooLong,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to fetch data: {0}")]
    FetchError(String),

    #[error("LLM processing error: {0}")]
    LlmError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequestBody | AppError::InputTooLong => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_)
            | AppError::FetchError(_)
            | AppError::LlmError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut res = response::error(status, self.to_string()).into_response();

        if let AppError::MethodNotAllowed(_) = self {
            res.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }

        res
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_allowed_advertises_post() {
        let res = AppError::MethodNotAllowed(Method::GET).into_response();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers().get(header::ALLOW).unwrap(), "POST");
    }

    #[test]
    fn upstream_failures_are_server_errors() {
        for err in [
            AppError::ConfigError("x".into()),
            AppError::FetchError("x".into()),
            AppError::LlmError("x".into()),
        ] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn client_facing_messages_are_fixed() {
        assert_eq!(AppError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(AppError::InvalidRequestBody.to_string(), "Invalid request body");
        assert_eq!(AppError::InputTooLong.to_string(), "Input too long");
        assert_eq!(
            AppError::MethodNotAllowed(Method::DELETE).to_string(),
            "Method DELETE not allowed"
        );
    }
}
