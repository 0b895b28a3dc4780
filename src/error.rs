use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::oracle::OracleError;

/// Request-level failures. Only a missing field is the caller's fault; the
/// rest surface as a generic server error and are not retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("prediction failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("failed to store review: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::Oracle(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::MissingField(_) => self.to_string(),
            _ => "Internal Server Error".to_string(),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(body)
    }
}
