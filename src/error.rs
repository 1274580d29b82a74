use crate::verb::Verb;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("could not find middleware function {name} on {controller}")]
    MiddlewareNotFound { name: String, controller: String },

    #[error("Unknown verb: {0}")]
    UnknownVerb(String),

    #[error("{key} is a request handler and cannot be bound to `param`; declare it with param_method")]
    ParamRoute { key: String },

    #[error("Router does not support verb: {verb}")]
    UnsupportedVerb { verb: Verb },

    #[error("Failed to downcast to {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Handler {key} panicked: {message}")]
    HandlerPanicked { key: String, message: String },

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("Failed to construct controller {name}: {source}")]
    Construction {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RouteError {
    /// Configuration errors are raised while declaring, resolving or
    /// registering routes; everything else happens at request time.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, RouteError::HandlerPanicked { .. })
    }
}

impl axum::response::IntoResponse for RouteError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
        (status, self.to_string()).into_response()
    }
}
