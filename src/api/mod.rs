// API module exposing analytics over HTTP
// Author: Gabriel Demetrios Lafis

mod handlers;
mod models;
mod routes;
mod server;
mod state;

pub use handlers::*;
pub use models::*;
pub use routes::*;
pub use server::*;
pub use state::*;

use std::error::Error;
use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::data::DataError;
use crate::processing::ProcessingError;
use crate::query::QueryError;
use crate::session::SessionError;
use crate::utils::AppError;

/// Represents an error in the API module
#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),
    NotFound(String),
    ServiceUnavailable(String),
    InternalError(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::ValidationError(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::InternalError(msg) => msg,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.message().to_string(),
        })
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Query(err) => err.into(),
            AppError::Session(err) => err.into(),
            AppError::Processing(err) => err.into(),
            AppError::Data(DataError::UnknownDimension(err)) => ApiError::ValidationError(err.to_string()),
            AppError::NoData(_) => ApiError::NotFound(err.to_string()),
            AppError::Fetch(err) => ApiError::ServiceUnavailable(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::InvalidArgument(msg) => ApiError::ValidationError(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
