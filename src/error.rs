use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use jsonwebtoken::errors::Error as JsonWebTokenError;
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Unauthorized(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("operation already in progress: {0}")]
    DuplicateOperation(String),

    #[error("business error: {0}")]
    BusinessError(String),

    #[error("jwt error")]
    JWTError(#[from] JsonWebTokenError),

    #[error("dotenv error")]
    DotEnvError(#[from] dotenv::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("multipart error: {0}")]
    MultipartError(#[from] actix_multipart::MultipartError),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("server error: {0}")]
    ServerError(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream(e.to_string())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) | Error::JWTError(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateOperation(_) => StatusCode::CONFLICT,
            Error::BusinessError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ownership_mismatch_maps_to_not_found() {
        assert_eq!(Error::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_operation_maps_to_conflict() {
        let err = Error::DuplicateOperation("create_donation".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("already in progress"));
    }
}
