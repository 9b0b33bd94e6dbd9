use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use application::AppError;
use serde::Serialize;
use std::fmt;

/// Failure body for every REST error: `{"message": ...}` with the status
/// drawn from the error's declared code.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Wrapper around AppError to implement ResponseError (defined in actix-web)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl fmt::Display for HttpAppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl ResponseError for HttpAppError {
    fn status_code(&self) -> StatusCode {
        let code = self.0.status_code();
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_code = self.0.error_code();
        let message = self.0.to_string();

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error_code = error_code,
                "Internal Server Error: {:?}",
                self.0
            );
        } else if status_code == StatusCode::UNAUTHORIZED {
            tracing::warn!(error_code = error_code, error_message = %message, "Auth Error");
        }

        let mut builder = HttpResponse::build(status_code);
        if let Some(retry_after) = self.0.retry_after_seconds() {
            builder.insert_header(("Retry-After", retry_after.to_string()));
        }
        builder.json(ErrorResponse { message })
    }
}
