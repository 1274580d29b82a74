use crate::handler::HandlerError;
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;

pub mod http;

pub use http::HttpExceptionFilter;

/// Context for exception handling
#[derive(Debug, Clone)]
pub struct ArgumentsHost {
    pub method: Method,
    pub uri: Uri,
}

impl ArgumentsHost {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self { method, uri }
    }
}

/// The ExceptionFilter trait
///
/// Filters receive errors raised while a request's handler chain runs.
/// They must return a valid Response.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an exception and return a response
    fn catch(&self, error: HandlerError, host: &ArgumentsHost) -> Response;
}

impl<F> ExceptionFilter for F
where
    F: Fn(HandlerError, &ArgumentsHost) -> Response + Send + Sync + 'static,
{
    fn catch(&self, error: HandlerError, host: &ArgumentsHost) -> Response {
        self(error, host)
    }
}

/// An error that carries the status it should be answered with.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpException {
    pub status: StatusCode,
    pub message: String,
}

impl HttpException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}
